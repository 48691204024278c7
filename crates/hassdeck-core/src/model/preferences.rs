// ── Preference bundle ──
//
// User preferences: visibility, naming, pinning and settings. The
// in-memory bundle is always defaults plus overrides.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::warn;

use super::EntityId;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// The four independently stored parts of the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PreferencePart {
    Settings,
    HiddenEntities,
    HiddenRooms,
    CustomNames,
}

// ── Settings ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Weather entity shown in the header; empty picks the first one.
    pub weather_source: String,
    /// `*`-wildcard patterns hiding noisy sensors.
    pub filter_patterns: Vec<String>,
    /// Polling interval in seconds; 0 falls back to the connection default.
    pub refresh_interval: u64,
    pub pinned_entities: Vec<EntityId>,
    pub pinned_automations: Vec<EntityId>,
    pub notification_recipients: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weather_source: String::new(),
            filter_patterns: vec![
                "*_linkquality".into(),
                "*_rssi".into(),
                "*_last_seen".into(),
            ],
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            pinned_entities: Vec::new(),
            pinned_automations: Vec::new(),
            notification_recipients: Vec::new(),
        }
    }
}

/// A partial settings update; `None` fields leave the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub weather_source: Option<String>,
    pub filter_patterns: Option<Vec<String>>,
    pub refresh_interval: Option<u64>,
    pub pinned_entities: Option<Vec<EntityId>>,
    pub pinned_automations: Option<Vec<EntityId>>,
    pub notification_recipients: Option<Vec<String>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Decode the keys present in a stored settings object.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(map.clone()))
    }
}

impl Settings {
    /// Copy with every present field of `patch` applied.
    pub fn patched(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = &patch.weather_source {
            next.weather_source.clone_from(v);
        }
        if let Some(v) = &patch.filter_patterns {
            next.filter_patterns.clone_from(v);
        }
        if let Some(v) = patch.refresh_interval {
            next.refresh_interval = v;
        }
        if let Some(v) = &patch.pinned_entities {
            next.pinned_entities.clone_from(v);
        }
        if let Some(v) = &patch.pinned_automations {
            next.pinned_automations.clone_from(v);
        }
        if let Some(v) = &patch.notification_recipients {
            next.notification_recipients.clone_from(v);
        }
        next
    }

    /// Defaults, then each stored layer key by key, later layers winning.
    ///
    /// A layer whose values do not decode is skipped as a whole.
    pub fn layered<'a>(layers: impl IntoIterator<Item = Option<&'a Map<String, Value>>>) -> Self {
        layers
            .into_iter()
            .flatten()
            .fold(Self::default(), |acc, layer| match SettingsPatch::from_map(layer) {
                Ok(patch) => acc.patched(&patch),
                Err(e) => {
                    warn!(error = %e, "ignoring undecodable settings layer");
                    acc
                }
            })
    }
}

// ── PreferenceBundle ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceBundle {
    pub hidden_entities: BTreeSet<EntityId>,
    pub hidden_rooms: BTreeSet<String>,
    pub custom_names: BTreeMap<EntityId, String>,
    pub settings: Settings,
}
