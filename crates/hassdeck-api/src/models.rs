// Wire types for the Home Assistant REST API.
//
// Field names follow the JSON the hub emits. Conversion into domain
// types happens in hassdeck-core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of `GET /api/states`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HassState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// `GET /api/` answers `{"message": "API running."}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Registry dump ───────────────────────────────────────────────────

/// Area, device, and entity registry records rendered by the hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDump {
    #[serde(default)]
    pub areas: Vec<RegistryArea>,
    #[serde(default)]
    pub devices: Vec<RegistryDevice>,
    #[serde(default)]
    pub entities: Vec<RegistryEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryArea {
    pub area_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntity {
    pub entity_id: String,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    /// `"diagnostic"` / `"config"` for non-primary entities.
    #[serde(default)]
    pub entity_category: Option<String>,
}
