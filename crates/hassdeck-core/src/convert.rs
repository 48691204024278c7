// ── Wire → domain conversions ──
//
// Maps hassdeck-api wire types onto the domain model. This is the only
// place that knows both shapes.

use hassdeck_api::{HassState, RegistryDump};
use tracing::trace;

use crate::model::{Area, Device, Entity, EntityCategory, EntityId, EntityLink, Registry};

impl From<HassState> for Entity {
    fn from(s: HassState) -> Self {
        Self {
            entity_id: EntityId::from(s.entity_id),
            status: s.state,
            attributes: s.attributes,
            last_changed: s.last_changed.unwrap_or_default(),
            last_updated: s.last_updated.or(s.last_changed).unwrap_or_default(),
        }
    }
}

impl From<RegistryDump> for Registry {
    fn from(dump: RegistryDump) -> Self {
        let areas = dump.areas.into_iter().map(|a| Area {
            name: a.name.filter(|n| !n.is_empty()).unwrap_or_else(|| a.area_id.clone()),
            id: a.area_id,
        });

        let devices = dump.devices.into_iter().map(|d| Device {
            id: d.id,
            name: d.name,
            area_id: d.area_id,
            manufacturer: d.manufacturer,
            model: d.model,
        });

        let entities = dump.entities.into_iter().map(|e| {
            let entity_category = e.entity_category.as_deref().and_then(|c| {
                let parsed = c.parse::<EntityCategory>().ok();
                if parsed.is_none() {
                    trace!(category = c, "unrecognized entity category");
                }
                parsed
            });
            (
                EntityId::from(e.entity_id),
                EntityLink {
                    area_id: e.area_id,
                    device_id: e.device_id,
                    entity_category,
                },
            )
        });

        Registry::new(areas, devices, entities)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hassdeck_api::models::{RegistryArea, RegistryDevice, RegistryEntity};
    use serde_json::json;

    #[test]
    fn state_without_timestamps_uses_epoch() {
        let state: HassState =
            serde_json::from_value(json!({"entity_id": "light.a", "state": "on"})).unwrap();
        let entity = Entity::from(state);
        assert_eq!(entity.status, "on");
        assert_eq!(entity.last_updated.timestamp(), 0);
    }

    #[test]
    fn registry_from_dump() {
        let dump = RegistryDump {
            areas: vec![RegistryArea {
                area_id: "kitchen".into(),
                name: None,
            }],
            devices: vec![RegistryDevice {
                id: "d1".into(),
                name: Some("Plug".into()),
                area_id: Some("kitchen".into()),
                manufacturer: None,
                model: None,
            }],
            entities: vec![RegistryEntity {
                entity_id: "sensor.plug_power".into(),
                area_id: None,
                device_id: Some("d1".into()),
                entity_category: Some("diagnostic".into()),
            }],
        };
        let reg = Registry::from(dump);
        let id = EntityId::from("sensor.plug_power");
        assert_eq!(reg.area_of(&id), Some("kitchen"));
        assert_eq!(reg.area_name("kitchen"), "kitchen");
        assert_eq!(reg.entity_category(&id), Some(EntityCategory::Diagnostic));
    }
}
