// ── Reactive entity store ──
//
// Single shared store for hub entities and user preferences. Every
// change goes through `dispatch`, and each new snapshot is broadcast
// to subscribers via a `watch` channel.

mod action;
mod reconcile;
mod state;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

pub use action::StoreAction;
pub(crate) use reconcile::field_value;
pub use state::{EntityList, PendingKey, PendingMarker, StoreState};

use crate::model::{Entity, EntityId, EntityRef};
use crate::stream::StateStream;

/// Central store; cheap to share behind an `Arc`.
///
/// Reads are wait-free snapshot clones. Writes are serialized by the
/// `watch` sender and are last-writer-wins.
pub struct EntityStore {
    state: watch::Sender<Arc<StoreState>>,
}

impl EntityStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(StoreState::default()));
        Self { state }
    }

    /// Apply one action. Returns `true` if a new snapshot was published.
    pub fn dispatch(&self, action: StoreAction) -> bool {
        let published = self.state.send_if_modified(|current| {
            match action::reduce(current, action) {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });
        trace!(published, "store dispatch");
        published
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<StoreState> {
        self.state.borrow().clone()
    }

    pub fn entity(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.state.borrow().entity(id).cloned()
    }

    /// Resolve a reference against the current snapshot.
    pub fn resolve(&self, entity_ref: &EntityRef) -> Option<Arc<Entity>> {
        self.entity(&entity_ref.id)
    }

    pub fn entity_count(&self) -> usize {
        self.state.borrow().entities().len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::model::{Category, ControlField, SettingsPatch};

    fn poll(store: &EntityStore, ids: &[(&str, &str)]) {
        let list = ids.iter().map(|(id, s)| Entity::new(*id, *s)).collect();
        store.dispatch(StoreAction::ReplaceAll(list));
    }

    #[test]
    fn update_only_rebuilds_matching_collection() {
        let store = EntityStore::new();
        poll(&store, &[("light.kitchen", "off"), ("switch.fan", "on"), ("sensor.t", "20")]);

        let before = store.snapshot();
        assert_eq!(before.lights().len(), 1);
        assert_eq!(before.lights()[0].status, "off");

        store.dispatch(StoreAction::UpdateEntity(Entity::new("light.kitchen", "on")));
        let after = store.snapshot();

        assert_eq!(after.lights()[0].status, "on");
        assert!(!Arc::ptr_eq(before.lights(), after.lights()));
        assert!(Arc::ptr_eq(before.switches(), after.switches()));
        assert!(Arc::ptr_eq(before.sensors(), after.sensors()));
        assert!(Arc::ptr_eq(before.covers(), after.covers()));
    }

    #[test]
    fn update_appends_unknown_entity() {
        let store = EntityStore::new();
        poll(&store, &[("light.a", "on")]);
        store.dispatch(StoreAction::UpdateEntity(Entity::new("light.b", "off")));
        let snap = store.snapshot();
        assert_eq!(snap.entities().len(), 2);
        assert_eq!(snap.lights().len(), 2);
    }

    #[test]
    fn identical_update_is_not_published() {
        let store = EntityStore::new();
        poll(&store, &[("lock.front", "locked")]);
        assert!(!store.dispatch(StoreAction::UpdateEntity(Entity::new("lock.front", "locked"))));
    }

    #[test]
    fn replace_all_partitions_without_loss() {
        let store = EntityStore::new();
        poll(
            &store,
            &[
                ("light.a", "on"),
                ("binary_sensor.door", "off"),
                ("alarm_control_panel.home", "disarmed"),
                ("person.sam", "home"),
                ("update.core", "off"),
                ("weather.home", "sunny"),
            ],
        );
        let snap = store.snapshot();
        let mut seen: Vec<&str> = Category::iter()
            .flat_map(|c| snap.collection(c).iter().map(|e| e.entity_id.as_str()))
            .collect();
        seen.sort_unstable();
        let mut expected: Vec<&str> = snap
            .entities()
            .iter()
            .filter(|e| e.category().is_some())
            .map(|e| e.entity_id.as_str())
            .collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
        assert_eq!(snap.entities().len(), 6);
        assert_eq!(snap.alarms().len(), 1);
        assert_eq!(snap.people().len(), 1);
        assert!(snap.last_refresh().is_some());
    }

    #[test]
    fn successful_poll_clears_error() {
        let store = EntityStore::new();
        store.dispatch(StoreAction::SetError("hub unreachable".into()));
        assert_eq!(store.snapshot().error(), Some("hub unreachable"));
        poll(&store, &[("light.a", "on")]);
        assert_eq!(store.snapshot().error(), None);
    }

    #[test]
    fn hide_then_show_restores_set() {
        let store = EntityStore::new();
        store.dispatch(StoreAction::SetHiddenEntities(BTreeSet::from([EntityId::from(
            "sensor.a",
        )])));
        let original = store.snapshot().hidden_entities().clone();

        assert!(store.dispatch(StoreAction::HideEntity("light.x".into())));
        assert!(!store.dispatch(StoreAction::HideEntity("light.x".into())));
        assert!(store.dispatch(StoreAction::ShowEntity("light.x".into())));

        assert_eq!(*store.snapshot().hidden_entities(), original);
    }

    #[test]
    fn room_visibility_round_trip() {
        let store = EntityStore::new();
        assert!(store.dispatch(StoreAction::HideRoom("garage".into())));
        assert!(!store.dispatch(StoreAction::HideRoom("garage".into())));
        assert!(store.dispatch(StoreAction::ShowRoom("garage".into())));
        assert!(!store.dispatch(StoreAction::ShowRoom("garage".into())));
        assert!(store.snapshot().hidden_rooms().is_empty());
    }

    #[test]
    fn empty_custom_name_removes_entry() {
        let store = EntityStore::new();
        store.dispatch(StoreAction::SetCustomName {
            entity_id: "light.a".into(),
            name: "Pendant".into(),
        });
        assert_eq!(
            store.snapshot().custom_names().get(&EntityId::from("light.a")).map(String::as_str),
            Some("Pendant")
        );
        store.dispatch(StoreAction::SetCustomName {
            entity_id: "light.a".into(),
            name: "  ".into(),
        });
        assert!(store.snapshot().custom_names().is_empty());
    }

    #[test]
    fn merge_settings_is_noop_when_equal() {
        let store = EntityStore::new();
        let patch = SettingsPatch {
            refresh_interval: Some(30),
            ..SettingsPatch::default()
        };
        assert!(!store.dispatch(StoreAction::MergeSettings(patch)));
        let patch = SettingsPatch {
            refresh_interval: Some(60),
            ..SettingsPatch::default()
        };
        assert!(store.dispatch(StoreAction::MergeSettings(patch)));
        assert_eq!(store.snapshot().settings().refresh_interval, 60);
    }

    #[test]
    fn pending_marker_survives_differing_poll() {
        let store = EntityStore::new();
        let cover = Entity::new("cover.garage", "open").with_attribute("current_position", json!(40));
        store.dispatch(StoreAction::ReplaceAll(vec![cover.clone()]));
        store.dispatch(StoreAction::SetPending {
            entity_id: "cover.garage".into(),
            field: ControlField::CoverPosition,
            marker: PendingMarker {
                value: 75.0,
                confirmed: Some(40.0),
                tolerance: 2.0,
                seq: 1,
            },
        });

        // Hub has not moved yet.
        store.dispatch(StoreAction::ReplaceAll(vec![cover.clone()]));
        let snap = store.snapshot();
        assert_eq!(snap.covers()[0].attribute_f64("current_position"), Some(75.0));
        assert!(snap.pending(&"cover.garage".into(), ControlField::CoverPosition).is_some());

        // Hub reports a rounded value inside the band.
        let arrived = cover.with_attribute("current_position", json!(76));
        store.dispatch(StoreAction::ReplaceAll(vec![arrived]));
        let snap = store.snapshot();
        assert_eq!(snap.covers()[0].attribute_f64("current_position"), Some(76.0));
        assert_eq!(snap.pending_count(), 0);
    }

    #[test]
    fn clear_pending_with_revert_restores_confirmed() {
        let store = EntityStore::new();
        let climate = Entity::new("climate.hall", "heat").with_attribute("temperature", json!(20.0));
        store.dispatch(StoreAction::ReplaceAll(vec![climate]));
        store.dispatch(StoreAction::SetPending {
            entity_id: "climate.hall".into(),
            field: ControlField::Temperature,
            marker: PendingMarker {
                value: 23.5,
                confirmed: Some(20.0),
                tolerance: 0.0,
                seq: 3,
            },
        });
        assert_eq!(store.snapshot().climate()[0].attribute_f64("temperature"), Some(23.5));

        assert!(store.dispatch(StoreAction::ClearPending {
            entity_id: "climate.hall".into(),
            field: ControlField::Temperature,
            revert: true,
        }));
        let snap = store.snapshot();
        assert_eq!(snap.climate()[0].attribute_f64("temperature"), Some(20.0));
        assert_eq!(snap.pending_count(), 0);

        // Nothing left to clear.
        assert!(!store.dispatch(StoreAction::ClearPending {
            entity_id: "climate.hall".into(),
            field: ControlField::Temperature,
            revert: true,
        }));
    }

    #[test]
    fn display_name_precedence() {
        let store = EntityStore::new();
        let named = Entity::new("light.a", "on").with_attribute("friendly_name", json!("Lamp"));
        store.dispatch(StoreAction::ReplaceAll(vec![named, Entity::new("light.b", "on")]));
        store.dispatch(StoreAction::SetCustomName {
            entity_id: "light.a".into(),
            name: "Reading Lamp".into(),
        });
        let snap = store.snapshot();
        assert_eq!(snap.display_name(&snap.lights()[0]), "Reading Lamp");
        assert_eq!(snap.display_name(&snap.lights()[1]), "light.b");
        assert_eq!(Category::Light, snap.lights()[1].category().unwrap());
    }
}
