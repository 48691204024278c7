// ── Controller ──
//
// Connection lifecycle for one hub: probe, initial load, periodic
// polling, and the entry points for mutations and aggregation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::{self, AreaGroup, NoiseFilter};
use crate::cache::TtlCache;
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::hub::{HubApi, RestHub};
use crate::model::{ControlField, Entity, EntityId, Registry};
use crate::mutation::{CommitTrigger, ContinuousControl, DiscreteMutator, MutationContext};
use crate::store::{EntityStore, StoreAction};
use crate::stream::StateStream;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error { message: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

// ── Controller ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<EntityStore>,
    hub: Arc<dyn HubApi>,
    mutations: MutationContext,
    connection_state: watch::Sender<ConnectionState>,
    /// Controller lifetime; parent of every connection token.
    cancel: CancellationToken,
    /// Cancelled on disconnect, replaced on each connect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    registry: TtlCache<(), Registry>,
}

impl Controller {
    /// Create a controller over `hub`. Does NOT connect; call
    /// [`connect()`](Self::connect) to load data and start polling.
    pub fn new(config: ControllerConfig, hub: Arc<dyn HubApi>) -> Self {
        let store = Arc::new(EntityStore::new());
        let mutations = MutationContext::new(Arc::clone(&store), Arc::clone(&hub));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = Mutex::new(cancel.child_token());
        let registry = TtlCache::new(config.registry_ttl);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                hub,
                mutations,
                connection_state,
                cancel,
                cancel_child,
                task_handles: Mutex::new(Vec::new()),
                registry,
            }),
        }
    }

    /// Controller over the hub's REST API.
    pub fn from_config(config: ControllerConfig) -> Result<Self, CoreError> {
        let hub = RestHub::from_config(&config)?;
        Ok(Self::new(config, Arc::new(hub)))
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Probe the hub, load everything, and start periodic polling.
    ///
    /// On failure the state moves to [`ConnectionState::Error`] and the
    /// error is returned; [`retry()`](Self::retry) starts over.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.stop_tasks().await;
        self.set_state(ConnectionState::Connecting);

        let loaded = async {
            self.inner.hub.check_connection().await?;
            self.full_refresh().await
        }
        .await;

        if let Err(e) = loaded {
            self.set_state(ConnectionState::Error {
                message: e.to_string(),
            });
            return Err(e);
        }

        if self.inner.config.refresh_interval_secs > 0 {
            let child = self.inner.cancel.child_token();
            *self.inner.cancel_child.lock().await = child.clone();
            let ctrl = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(ctrl, child)));
        }

        self.set_state(ConnectionState::Connected);
        info!(url = %self.inner.config.url, "connected to hub");
        Ok(())
    }

    /// Stop polling and reset to [`Disconnected`](ConnectionState::Disconnected).
    ///
    /// In-flight commands are not cancelled.
    pub async fn disconnect(&self) {
        self.stop_tasks().await;
        self.set_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Reconnect after an error.
    pub async fn retry(&self) -> Result<(), CoreError> {
        debug!("retrying connection");
        self.connect().await
    }

    /// Stop every task for good. The controller cannot reconnect afterwards.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.disconnect().await;
    }

    async fn stop_tasks(&self) {
        self.inner.cancel_child.lock().await.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.connection_state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Fetch every entity (and the registry, when stale) into the store.
    ///
    /// A failed poll keeps the last good snapshot and records the error
    /// in the store; connection failures also move the connection state.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        match self.poll().await {
            Ok(count) => {
                debug!(count, "poll complete");
                // The polling timer recovers a connection in error.
                self.inner.connection_state.send_if_modified(|current| {
                    if matches!(current, ConnectionState::Error { .. }) {
                        *current = ConnectionState::Connected;
                        true
                    } else {
                        false
                    }
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "poll failed");
                self.inner.store.dispatch(StoreAction::SetError(e.to_string()));
                if e.is_connection_error() {
                    self.set_state(ConnectionState::Error {
                        message: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    async fn poll(&self) -> Result<usize, CoreError> {
        self.refresh_registry(false).await?;
        let states = self.inner.hub.fetch_states().await?;
        let count = states.len();
        self.inner.store.dispatch(StoreAction::ReplaceAll(states));
        Ok(count)
    }

    /// Refresh area/device lookups if the cached snapshot has expired.
    ///
    /// Non-connection failures keep the previous registry.
    pub async fn refresh_registry(&self, force: bool) -> Result<(), CoreError> {
        if !force && self.inner.registry.is_fresh(&()) {
            return Ok(());
        }
        match self.inner.hub.fetch_registry().await {
            Ok(registry) => {
                debug!(
                    areas = registry.areas().count(),
                    devices = registry.device_count(),
                    "registry refreshed"
                );
                self.inner.registry.insert((), registry.clone());
                self.inner
                    .store
                    .dispatch(StoreAction::ReplaceRegistry(registry));
                Ok(())
            }
            Err(e) if e.is_connection_error() => Err(e),
            Err(e) => {
                warn!(error = %e, "registry refresh failed, keeping previous lookups");
                Ok(())
            }
        }
    }

    /// Current poll period: the settings value, else the configured default.
    fn refresh_period(&self) -> Duration {
        let from_settings = self.inner.store.snapshot().settings().refresh_interval;
        let secs = if from_settings > 0 {
            from_settings
        } else {
            self.inner.config.refresh_interval_secs
        };
        Duration::from_secs(secs.max(1))
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// Connect without polling, run `f`, disconnect.
    pub async fn oneshot<F, Fut, T>(
        mut config: ControllerConfig,
        hub: Arc<dyn HubApi>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        config.refresh_interval_secs = 0;
        let controller = Controller::new(config, hub);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn current_connection_state(&self) -> ConnectionState {
        self.inner.connection_state.borrow().clone()
    }

    /// Subscribe to store snapshots.
    pub fn subscribe(&self) -> StateStream {
        self.inner.store.subscribe()
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn mutations(&self) -> &MutationContext {
        &self.inner.mutations
    }

    pub fn discrete(&self) -> DiscreteMutator {
        DiscreteMutator::new(self.inner.mutations.clone())
    }

    /// Bind a continuous control with the configured commit trigger.
    ///
    /// Temperature commits after the idle debounce; everything else on release.
    pub fn continuous(
        &self,
        entity_id: EntityId,
        field: ControlField,
    ) -> Result<ContinuousControl, CoreError> {
        let config = &self.inner.config;
        let trigger = match field {
            ControlField::Temperature => CommitTrigger::IdleTimeout(config.temperature_debounce),
            _ => CommitTrigger::Release,
        };
        ContinuousControl::new(
            self.inner.mutations.clone(),
            entity_id,
            field,
            trigger,
            config.position_tolerance,
        )
    }

    // ── Aggregation ──────────────────────────────────────────────────

    /// Area groups of the current snapshot, filtered by the current settings.
    pub fn area_groups(&self, edit_mode: bool) -> Vec<AreaGroup> {
        let state = self.inner.store.snapshot();
        let noise = NoiseFilter::from_settings(state.settings());
        aggregate::area_groups(&state, edit_mode, &noise)
    }

    pub fn related(&self, entity_id: &EntityId) -> Vec<Arc<Entity>> {
        aggregate::related_entities(&self.inner.store.snapshot(), entity_id)
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Poll the hub until cancelled, re-reading the period every cycle.
async fn refresh_task(controller: Controller, cancel: CancellationToken) {
    loop {
        let period = controller.refresh_period();
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {
                if let Err(e) = controller.full_refresh().await {
                    debug!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
    debug!("refresh task stopped");
}
