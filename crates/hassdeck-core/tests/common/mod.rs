// Shared fixtures for hassdeck-core integration tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use hassdeck_core::{Controller, ControllerConfig, CoreError, Entity, HubApi, Registry, ServiceCall};

/// How the hub answers one service call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Outcome {
    pub delay: Duration,
    pub fail: bool,
}

impl Outcome {
    pub fn fail() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn after(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// In-memory hub that records every call.
#[derive(Default)]
pub struct MockHub {
    states: Mutex<Vec<Entity>>,
    registry: Mutex<Registry>,
    calls: Mutex<Vec<ServiceCall>>,
    script: Mutex<VecDeque<Outcome>>,
    reachable: AtomicBool,
    polls: AtomicUsize,
    registry_fetches: AtomicUsize,
}

impl MockHub {
    pub fn new(states: Vec<Entity>) -> Arc<Self> {
        let hub = Self::default();
        hub.reachable.store(true, Ordering::SeqCst);
        *hub.states.lock().unwrap() = states;
        Arc::new(hub)
    }

    pub fn set_states(&self, states: Vec<Entity>) {
        *self.states.lock().unwrap() = states;
    }

    pub fn set_registry(&self, registry: Registry) {
        *self.registry.lock().unwrap() = registry;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Queue the outcome of the next service call.
    pub fn push_outcome(&self, outcome: Outcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn registry_fetch_count(&self) -> usize {
        self.registry_fetches.load(Ordering::SeqCst)
    }

    fn unreachable() -> CoreError {
        CoreError::ConnectionFailed {
            url: "http://hub.test:8123".into(),
            reason: "connection refused".into(),
        }
    }
}

#[async_trait]
impl HubApi for MockHub {
    async fn check_connection(&self) -> Result<(), CoreError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Self::unreachable())
        }
    }

    async fn fetch_states(&self) -> Result<Vec<Entity>, CoreError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(self.states.lock().unwrap().clone())
    }

    async fn fetch_registry(&self) -> Result<Registry, CoreError> {
        self.registry_fetches.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(self.registry.lock().unwrap().clone())
    }

    async fn call_service(&self, call: &ServiceCall) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(call.clone());
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or_default();
        if !outcome.delay.is_zero() {
            tokio::time::sleep(outcome.delay).await;
        }
        if outcome.fail {
            Err(CoreError::CommandRejected {
                message: "service call failed".into(),
                status: Some(500),
            })
        } else {
            Ok(())
        }
    }
}

pub fn config() -> ControllerConfig {
    ControllerConfig::new(
        Url::parse("http://hub.test:8123").unwrap(),
        SecretString::from("test-token".to_string()),
    )
}

/// A connected controller without background polling.
pub async fn connected(hub: &Arc<MockHub>) -> Controller {
    let mut config = config();
    config.refresh_interval_secs = 0;
    let controller = Controller::new(config, Arc::clone(hub) as Arc<dyn HubApi>);
    controller.connect().await.unwrap();
    controller
}
