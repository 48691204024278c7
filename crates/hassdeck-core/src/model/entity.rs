// ── Entity ──
//
// One hub state record. Entities are replaced wholesale, never
// deep-merged: every edit produces a new value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Category, EntityId, FeatureSet};

/// A hub entity: status string plus an open attribute record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: EntityId,
    /// Primary state, e.g. `"on"`, `"locked"`, `"armed_away"`.
    #[serde(rename = "state")]
    pub status: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: DateTime<Utc>,
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
}

impl Entity {
    pub fn new(entity_id: impl Into<EntityId>, status: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            status: status.into(),
            attributes: Map::new(),
            last_changed: DateTime::default(),
            last_updated: DateTime::default(),
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.entity_id.category()
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Numeric attribute; numeric strings are accepted too.
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn features(&self) -> FeatureSet {
        let bits = self
            .attributes
            .get("supported_features")
            .and_then(Value::as_u64)
            .and_then(|b| u32::try_from(b).ok());
        FeatureSet::new(self.category(), bits)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.status.as_str(), "unavailable" | "unknown")
    }

    // ── Derived copies ───────────────────────────────────────────────

    /// Copy with a different status.
    pub fn with_status(&self, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..self.clone()
        }
    }

    /// Copy with one attribute replaced.
    pub fn with_attribute(&self, key: &str, value: Value) -> Self {
        let mut next = self.clone();
        next.attributes.insert(key.to_owned(), value);
        next
    }
}

// ── EntityRef ───────────────────────────────────────────────────────

/// A pointer to an entity, resolved against the store on every read.
///
/// Holding an `EntityRef` instead of an `Entity` keeps detail views from
/// rendering a snapshot that polling has already replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: EntityId,
    pub category: Option<Category>,
}

impl EntityRef {
    pub fn new(id: impl Into<EntityId>) -> Self {
        let id = id.into();
        let category = id.category();
        Self { id, category }
    }
}

impl From<&Entity> for EntityRef {
    fn from(entity: &Entity) -> Self {
        Self::new(entity.entity_id.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Feature;
    use serde_json::json;

    #[test]
    fn wire_state_maps_to_status() {
        let entity: Entity = serde_json::from_value(json!({
            "entity_id": "lock.front",
            "state": "locked",
            "attributes": {"supported_features": 1}
        }))
        .unwrap();
        assert_eq!(entity.status, "locked");
        assert_eq!(entity.last_changed, DateTime::<Utc>::default());
        assert!(entity.features().supports(Feature::LockOpen));
    }

    #[test]
    fn numeric_strings_are_numbers() {
        let entity = Entity::new("sensor.t", "1").with_attribute("current_position", json!("42"));
        assert_eq!(entity.attribute_f64("current_position"), Some(42.0));
        assert_eq!(entity.attribute_f64("missing"), None);
    }

    #[test]
    fn with_status_leaves_original_untouched() {
        let off = Entity::new("light.kitchen", "off");
        let on = off.with_status("on");
        assert_eq!(off.status, "off");
        assert_eq!(on.status, "on");
        assert_eq!(on.entity_id, off.entity_id);
    }

    #[test]
    fn entity_ref_carries_category() {
        let r = EntityRef::new("cover.garage");
        assert_eq!(r.category, Some(Category::Cover));
    }
}
