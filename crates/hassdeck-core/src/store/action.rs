// ── Store transitions ──
//
// The dispatch vocabulary and the pure reducer behind it. `reduce`
// returns `None` when an action would not change anything, so no-op
// dispatches never wake subscribers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;

use super::reconcile::{collect_category, overlay, partition, reconcile_poll};
use super::state::{PendingKey, PendingMarker, StoreState};
use crate::model::{
    ControlField, Entity, EntityId, PreferenceBundle, Registry, SettingsPatch,
};

/// Every way the store can change.
#[derive(Debug, Clone)]
pub enum StoreAction {
    /// Full poll result; rebuilds every collection and reconciles markers.
    ReplaceAll(Vec<Entity>),
    /// Replace (or append) one entity; rebuilds only its category.
    UpdateEntity(Entity),

    SetHiddenEntities(BTreeSet<EntityId>),
    HideEntity(EntityId),
    ShowEntity(EntityId),

    SetHiddenRooms(BTreeSet<String>),
    HideRoom(String),
    ShowRoom(String),

    SetCustomNames(BTreeMap<EntityId, String>),
    /// An empty name removes the custom name.
    SetCustomName { entity_id: EntityId, name: String },
    RemoveCustomName(EntityId),

    MergeSettings(SettingsPatch),
    /// The merged preference bundle, applied as one transition.
    LoadSyncedBundle(Box<PreferenceBundle>),

    ReplaceRegistry(Registry),

    /// Record a committed value and show it until the hub confirms.
    SetPending {
        entity_id: EntityId,
        field: ControlField,
        marker: PendingMarker,
    },
    /// Drop a marker; with `revert`, restore the last confirmed value.
    ClearPending {
        entity_id: EntityId,
        field: ControlField,
        revert: bool,
    },

    SetError(String),
    ClearError,
}

/// Compute the next snapshot, or `None` for a no-op.
pub(crate) fn reduce(state: &StoreState, action: StoreAction) -> Option<StoreState> {
    match action {
        StoreAction::ReplaceAll(list) => {
            let (entities, pending) = reconcile_poll(list, &state.pending);
            let mut next = state.clone();
            next.collections = partition(&entities);
            next.entities = Arc::new(entities);
            next.pending = Arc::new(pending);
            next.last_refresh = Some(Utc::now());
            next.error = None;
            Some(next)
        }

        StoreAction::UpdateEntity(entity) => {
            if state.entity(&entity.entity_id).is_some_and(|e| **e == entity) {
                return None;
            }
            let mut next = state.clone();
            put_entity(&mut next, entity);
            Some(next)
        }

        // ── Hidden entities ──────────────────────────────────────────
        StoreAction::SetHiddenEntities(set) => {
            (*state.hidden_entities != set).then(|| StoreState {
                hidden_entities: Arc::new(set),
                ..state.clone()
            })
        }
        StoreAction::HideEntity(id) => {
            if state.hidden_entities.contains(&id) {
                return None;
            }
            let mut set = (*state.hidden_entities).clone();
            set.insert(id);
            Some(StoreState {
                hidden_entities: Arc::new(set),
                ..state.clone()
            })
        }
        StoreAction::ShowEntity(id) => {
            if !state.hidden_entities.contains(&id) {
                return None;
            }
            let mut set = (*state.hidden_entities).clone();
            set.remove(&id);
            Some(StoreState {
                hidden_entities: Arc::new(set),
                ..state.clone()
            })
        }

        // ── Hidden rooms ─────────────────────────────────────────────
        StoreAction::SetHiddenRooms(set) => (*state.hidden_rooms != set).then(|| StoreState {
            hidden_rooms: Arc::new(set),
            ..state.clone()
        }),
        StoreAction::HideRoom(area_id) => {
            if state.hidden_rooms.contains(&area_id) {
                return None;
            }
            let mut set = (*state.hidden_rooms).clone();
            set.insert(area_id);
            Some(StoreState {
                hidden_rooms: Arc::new(set),
                ..state.clone()
            })
        }
        StoreAction::ShowRoom(area_id) => {
            if !state.hidden_rooms.contains(&area_id) {
                return None;
            }
            let mut set = (*state.hidden_rooms).clone();
            set.remove(&area_id);
            Some(StoreState {
                hidden_rooms: Arc::new(set),
                ..state.clone()
            })
        }

        // ── Custom names ─────────────────────────────────────────────
        StoreAction::SetCustomNames(names) => {
            (*state.custom_names != names).then(|| StoreState {
                custom_names: Arc::new(names),
                ..state.clone()
            })
        }
        StoreAction::SetCustomName { entity_id, name } => {
            let name = name.trim();
            if name.is_empty() {
                return reduce(state, StoreAction::RemoveCustomName(entity_id));
            }
            if state.custom_names.get(&entity_id).map(String::as_str) == Some(name) {
                return None;
            }
            let mut names = (*state.custom_names).clone();
            names.insert(entity_id, name.to_owned());
            Some(StoreState {
                custom_names: Arc::new(names),
                ..state.clone()
            })
        }
        StoreAction::RemoveCustomName(entity_id) => {
            if !state.custom_names.contains_key(&entity_id) {
                return None;
            }
            let mut names = (*state.custom_names).clone();
            names.remove(&entity_id);
            Some(StoreState {
                custom_names: Arc::new(names),
                ..state.clone()
            })
        }

        // ── Settings / bundle ────────────────────────────────────────
        StoreAction::MergeSettings(patch) => {
            let settings = state.settings.patched(&patch);
            (settings != *state.settings).then(|| StoreState {
                settings: Arc::new(settings),
                ..state.clone()
            })
        }
        StoreAction::LoadSyncedBundle(bundle) => {
            let PreferenceBundle {
                hidden_entities,
                hidden_rooms,
                custom_names,
                settings,
            } = *bundle;
            let unchanged = *state.hidden_entities == hidden_entities
                && *state.hidden_rooms == hidden_rooms
                && *state.custom_names == custom_names
                && *state.settings == settings;
            (!unchanged).then(|| StoreState {
                hidden_entities: Arc::new(hidden_entities),
                hidden_rooms: Arc::new(hidden_rooms),
                custom_names: Arc::new(custom_names),
                settings: Arc::new(settings),
                ..state.clone()
            })
        }

        StoreAction::ReplaceRegistry(registry) => {
            (*state.registry != registry).then(|| StoreState {
                registry: Arc::new(registry),
                ..state.clone()
            })
        }

        // ── Pending markers ──────────────────────────────────────────
        StoreAction::SetPending {
            entity_id,
            field,
            marker,
        } => {
            let mut next = state.clone();
            if let Some(entity) = state.entity(&entity_id) {
                put_entity(&mut next, overlay(entity, field, marker.value));
            }
            let mut pending = (*state.pending).clone();
            pending.insert(PendingKey { entity_id, field }, marker);
            next.pending = Arc::new(pending);
            Some(next)
        }
        StoreAction::ClearPending {
            entity_id,
            field,
            revert,
        } => {
            let key = PendingKey { entity_id, field };
            let marker = state.pending.get(&key)?;
            let mut next = state.clone();
            if revert {
                let confirmed = marker.confirmed;
                if let (Some(value), Some(entity)) = (confirmed, state.entity(&key.entity_id)) {
                    put_entity(&mut next, overlay(entity, field, value));
                }
            }
            let mut pending = (*state.pending).clone();
            pending.remove(&key);
            next.pending = Arc::new(pending);
            Some(next)
        }

        // ── Errors ───────────────────────────────────────────────────
        StoreAction::SetError(message) => {
            (state.error.as_deref() != Some(message.as_str())).then(|| StoreState {
                error: Some(message),
                ..state.clone()
            })
        }
        StoreAction::ClearError => state.error.is_some().then(|| StoreState {
            error: None,
            ..state.clone()
        }),
    }
}

/// Replace or append one entity and rebuild only its category.
fn put_entity(next: &mut StoreState, entity: Entity) {
    let category = entity.category();
    let mut list: Vec<Arc<Entity>> = (*next.entities).clone();
    match list.iter_mut().find(|e| e.entity_id == entity.entity_id) {
        Some(slot) => *slot = Arc::new(entity),
        None => list.push(Arc::new(entity)),
    }
    if let Some(category) = category {
        next.collections[category.index()] = collect_category(&list, category);
    }
    next.entities = Arc::new(list);
}
