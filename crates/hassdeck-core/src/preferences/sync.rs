// ── Preference sync ──
//
// Loads the bundle from the remote store and local storage, and writes
// every change back to both. Remote failures never reach the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::local::LocalStore;
use super::remote::{PreferenceBackend, RemoteBundle};
use crate::model::{EntityId, PreferenceBundle, PreferencePart, Settings, SettingsPatch};
use crate::store::{EntityStore, StoreAction, StoreState};

/// Parts as found in local storage.
#[derive(Debug, Default)]
struct LocalBundle {
    settings: Option<Map<String, Value>>,
    hidden_entities: Option<BTreeSet<EntityId>>,
    hidden_rooms: Option<BTreeSet<String>>,
    custom_names: Option<BTreeMap<EntityId, String>>,
}

impl LocalBundle {
    fn read(local: &dyn LocalStore) -> Self {
        Self {
            settings: read_part(local, PreferencePart::Settings),
            hidden_entities: read_part(local, PreferencePart::HiddenEntities),
            hidden_rooms: read_part(local, PreferencePart::HiddenRooms),
            custom_names: read_part(local, PreferencePart::CustomNames),
        }
    }
}

fn read_part<T: DeserializeOwned>(local: &dyn LocalStore, part: PreferencePart) -> Option<T> {
    let value = local.read(part.as_ref())?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(%part, error = %e, "ignoring malformed local preference");
            None
        }
    }
}

/// Remote wins per part when present and non-empty.
fn prefer<T: Default>(remote: Option<T>, local: Option<T>, is_empty: impl Fn(&T) -> bool) -> T {
    remote
        .filter(|r| !is_empty(r))
        .or(local)
        .unwrap_or_default()
}

fn merge(local: LocalBundle, remote: Option<RemoteBundle>) -> PreferenceBundle {
    let remote = remote.unwrap_or_default();
    PreferenceBundle {
        settings: Settings::layered([local.settings.as_ref(), remote.settings.as_ref()]),
        hidden_entities: prefer(remote.hidden_entities, local.hidden_entities, BTreeSet::is_empty),
        hidden_rooms: prefer(remote.hidden_rooms, local.hidden_rooms, BTreeSet::is_empty),
        custom_names: prefer(remote.custom_names, local.custom_names, BTreeMap::is_empty),
    }
}

/// One lock per part: pushes of a part run one at a time, in order.
#[derive(Default)]
struct PushLocks {
    settings: AsyncMutex<()>,
    hidden_entities: AsyncMutex<()>,
    hidden_rooms: AsyncMutex<()>,
    custom_names: AsyncMutex<()>,
}

impl PushLocks {
    fn part(&self, part: PreferencePart) -> &AsyncMutex<()> {
        match part {
            PreferencePart::Settings => &self.settings,
            PreferencePart::HiddenEntities => &self.hidden_entities,
            PreferencePart::HiddenRooms => &self.hidden_rooms,
            PreferencePart::CustomNames => &self.custom_names,
        }
    }
}

// ── PreferenceSync ──────────────────────────────────────────────────

pub struct PreferenceSync {
    store: Arc<EntityStore>,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn PreferenceBackend>>,
    remote_available: AtomicBool,
    pushes: Mutex<JoinSet<()>>,
    push_locks: Arc<PushLocks>,
}

impl PreferenceSync {
    pub fn new(
        store: Arc<EntityStore>,
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn PreferenceBackend>>,
    ) -> Self {
        Self {
            store,
            local,
            remote,
            remote_available: AtomicBool::new(false),
            pushes: Mutex::new(JoinSet::new()),
            push_locks: Arc::new(PushLocks::default()),
        }
    }

    /// Whether the remote store answered at the last `load`.
    pub fn remote_available(&self) -> bool {
        self.remote_available.load(Ordering::Acquire)
    }

    /// Resolve the bundle and publish it to the store in one transition.
    pub async fn load(&self) -> PreferenceBundle {
        let local = LocalBundle::read(self.local.as_ref());

        let remote = match &self.remote {
            Some(remote) if remote.is_available().await => match remote.fetch().await {
                Ok(bundle) => Some(bundle),
                Err(e) => {
                    warn!(error = %e, "remote preferences unreadable, using local copy");
                    None
                }
            },
            Some(_) => {
                debug!("preference store unavailable, using local copy");
                None
            }
            None => None,
        };
        self.remote_available
            .store(remote.is_some(), Ordering::Release);

        let bundle = merge(local, remote);
        self.store
            .dispatch(StoreAction::LoadSyncedBundle(Box::new(bundle.clone())));
        bundle
    }

    // ── Mutations ────────────────────────────────────────────────────
    //
    // Each returns `true` if the bundle changed.

    pub fn hide_entity(&self, entity_id: EntityId) -> bool {
        self.apply(StoreAction::HideEntity(entity_id), PreferencePart::HiddenEntities)
    }

    pub fn show_entity(&self, entity_id: EntityId) -> bool {
        self.apply(StoreAction::ShowEntity(entity_id), PreferencePart::HiddenEntities)
    }

    pub fn hide_room(&self, area_id: impl Into<String>) -> bool {
        self.apply(StoreAction::HideRoom(area_id.into()), PreferencePart::HiddenRooms)
    }

    pub fn show_room(&self, area_id: impl Into<String>) -> bool {
        self.apply(StoreAction::ShowRoom(area_id.into()), PreferencePart::HiddenRooms)
    }

    /// An empty name removes the custom name.
    pub fn set_custom_name(&self, entity_id: EntityId, name: impl Into<String>) -> bool {
        self.apply(
            StoreAction::SetCustomName {
                entity_id,
                name: name.into(),
            },
            PreferencePart::CustomNames,
        )
    }

    pub fn remove_custom_name(&self, entity_id: EntityId) -> bool {
        self.apply(
            StoreAction::RemoveCustomName(entity_id),
            PreferencePart::CustomNames,
        )
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        self.apply(StoreAction::MergeSettings(patch), PreferencePart::Settings)
    }

    /// Wait for every queued remote push.
    pub async fn flush(&self) {
        let mut pushes = std::mem::take(
            &mut *self.pushes.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(result) = pushes.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "preference push task failed");
            }
        }
    }

    fn apply(&self, action: StoreAction, part: PreferencePart) -> bool {
        if !self.store.dispatch(action) {
            return false;
        }
        let state = self.store.snapshot();
        self.save_local(&state, part);
        if self.remote_available() {
            self.push(part);
        }
        true
    }

    fn save_local(&self, state: &StoreState, part: PreferencePart) {
        let value = match part {
            PreferencePart::Settings => serde_json::to_value(state.settings()),
            PreferencePart::HiddenEntities => serde_json::to_value(state.hidden_entities()),
            PreferencePart::HiddenRooms => serde_json::to_value(state.hidden_rooms()),
            PreferencePart::CustomNames => serde_json::to_value(state.custom_names()),
        };
        let result = value
            .map_err(|e| e.to_string())
            .and_then(|v| self.local.write(part.as_ref(), &v).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(%part, error = %e, "failed to save preference locally");
        }
    }

    /// Queue a remote save of `part`.
    ///
    /// The save reads the store once it holds the part's lock, so the last
    /// push to land always carries the newest value.
    fn push(&self, part: PreferencePart) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!(%part, "no runtime, skipping preference push");
            return;
        };

        let store = Arc::clone(&self.store);
        let locks = Arc::clone(&self.push_locks);
        let task = async move {
            let _turn = locks.part(part).lock().await;
            let state = store.snapshot();
            let result = match part {
                PreferencePart::Settings => remote.save_settings(state.settings()).await,
                PreferencePart::HiddenEntities => {
                    remote.save_hidden_entities(state.hidden_entities()).await
                }
                PreferencePart::HiddenRooms => remote.save_hidden_rooms(state.hidden_rooms()).await,
                PreferencePart::CustomNames => remote.save_custom_names(state.custom_names()).await,
            };
            match result {
                Ok(()) => debug!(%part, "preference pushed"),
                Err(e) => warn!(%part, error = %e, "preference push failed"),
            }
        };

        let mut pushes = self.pushes.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop finished pushes.
        while pushes.try_join_next().is_some() {}
        pushes.spawn_on(task, &handle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn remote_part_wins_only_when_non_empty() {
        let local = LocalBundle {
            hidden_rooms: Some(BTreeSet::from(["garage".to_string()])),
            custom_names: Some(BTreeMap::from([("light.a".into(), "Lamp".to_string())])),
            ..LocalBundle::default()
        };
        let remote = RemoteBundle {
            hidden_rooms: Some(BTreeSet::new()),
            custom_names: Some(BTreeMap::from([("light.a".into(), "Pendant".to_string())])),
            ..RemoteBundle::default()
        };

        let bundle = merge(local, Some(remote));
        assert_eq!(bundle.hidden_rooms, BTreeSet::from(["garage".to_string()]));
        assert_eq!(bundle.custom_names[&EntityId::from("light.a")], "Pendant");
    }

    #[test]
    fn settings_keep_local_keys_missing_remotely() {
        let local = LocalBundle {
            settings: json!({"refresh_interval": 60, "weather_source": "weather.home"})
                .as_object()
                .cloned(),
            ..LocalBundle::default()
        };
        let remote = RemoteBundle {
            settings: json!({"weather_source": "weather.roof"}).as_object().cloned(),
            ..RemoteBundle::default()
        };

        let settings = merge(local, Some(remote)).settings;
        assert_eq!(settings.refresh_interval, 60);
        assert_eq!(settings.weather_source, "weather.roof");
        assert_eq!(settings.filter_patterns, Settings::default().filter_patterns);
    }

    #[test]
    fn nothing_stored_yields_defaults() {
        assert_eq!(merge(LocalBundle::default(), None), PreferenceBundle::default());
    }
}
