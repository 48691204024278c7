// ── Remote preference backend ──
//
// The shared preference store every dashboard instance reads at startup.
// Each bundle part is an independent document.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use hassdeck_api::{PrefsClient, TransportConfig};

use crate::config::PreferenceStoreConfig;
use crate::error::CoreError;
use crate::model::{EntityId, PreferencePart, Settings};

/// Parts as stored remotely; `None` when a part was never saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteBundle {
    /// Only the keys present remotely, merged over local settings.
    pub settings: Option<Map<String, Value>>,
    pub hidden_entities: Option<BTreeSet<EntityId>>,
    pub hidden_rooms: Option<BTreeSet<String>>,
    pub custom_names: Option<BTreeMap<EntityId, String>>,
}

#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    /// Cheap reachability probe.
    async fn is_available(&self) -> bool;

    async fn fetch(&self) -> Result<RemoteBundle, CoreError>;

    async fn save_settings(&self, settings: &Settings) -> Result<(), CoreError>;

    async fn save_hidden_entities(&self, hidden: &BTreeSet<EntityId>) -> Result<(), CoreError>;

    async fn save_hidden_rooms(&self, hidden: &BTreeSet<String>) -> Result<(), CoreError>;

    async fn save_custom_names(&self, names: &BTreeMap<EntityId, String>) -> Result<(), CoreError>;
}

// ── HTTP key-value store ────────────────────────────────────────────

/// `PreferenceBackend` over the HTTP document store.
pub struct RemotePrefs {
    client: PrefsClient,
}

impl RemotePrefs {
    pub fn new(client: PrefsClient) -> Self {
        Self { client }
    }

    pub fn from_config(
        config: &PreferenceStoreConfig,
        transport: &TransportConfig,
    ) -> Result<Self, CoreError> {
        let client = PrefsClient::new(config.url.clone(), config.token.as_ref(), transport)?;
        Ok(Self { client })
    }

    async fn put<T: Serialize + Sync>(&self, part: PreferencePart, value: &T) -> Result<(), CoreError> {
        debug!(%part, "pushing preference part");
        self.client
            .put_part(part.as_ref(), value)
            .await
            .map_err(sync_error)
    }
}

fn sync_error(err: hassdeck_api::Error) -> CoreError {
    match err {
        hassdeck_api::Error::Authentication { message } => {
            CoreError::AuthenticationFailed { message }
        }
        other => CoreError::Sync {
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl PreferenceBackend for RemotePrefs {
    async fn is_available(&self) -> bool {
        match self.client.health().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "preference store unavailable");
                false
            }
        }
    }

    async fn fetch(&self) -> Result<RemoteBundle, CoreError> {
        let (settings, hidden_entities, hidden_rooms, custom_names) = tokio::try_join!(
            self.client.get_part(PreferencePart::Settings.as_ref()),
            self.client.get_part(PreferencePart::HiddenEntities.as_ref()),
            self.client.get_part(PreferencePart::HiddenRooms.as_ref()),
            self.client.get_part(PreferencePart::CustomNames.as_ref()),
        )
        .map_err(sync_error)?;

        Ok(RemoteBundle {
            settings,
            hidden_entities,
            hidden_rooms,
            custom_names,
        })
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), CoreError> {
        self.put(PreferencePart::Settings, settings).await
    }

    async fn save_hidden_entities(&self, hidden: &BTreeSet<EntityId>) -> Result<(), CoreError> {
        self.put(PreferencePart::HiddenEntities, hidden).await
    }

    async fn save_hidden_rooms(&self, hidden: &BTreeSet<String>) -> Result<(), CoreError> {
        self.put(PreferencePart::HiddenRooms, hidden).await
    }

    async fn save_custom_names(&self, names: &BTreeMap<EntityId, String>) -> Result<(), CoreError> {
        self.put(PreferencePart::CustomNames, names).await
    }
}
