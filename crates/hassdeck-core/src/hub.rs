// ── Hub collaborator ──
//
// The engine talks to the hub only through `HubApi`. `RestHub` is the
// shipped adapter over the REST client; tests supply their own.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use hassdeck_api::HassClient;

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, Registry};

// ── ServiceCall ─────────────────────────────────────────────────────

/// One hub command: `<domain>.<service>` with a target and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub target: Option<EntityId>,
    pub data: Map<String, Value>,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            target: None,
            data: Map::new(),
        }
    }

    /// A call in the entity's own domain, targeting it.
    pub fn for_entity(entity_id: &EntityId, service: impl Into<String>) -> Self {
        Self {
            domain: entity_id.domain().unwrap_or_default().to_owned(),
            service: service.into(),
            target: Some(entity_id.clone()),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// JSON body for the service endpoint: `entity_id` plus data.
    pub fn payload(&self) -> Map<String, Value> {
        let mut body = self.data.clone();
        if let Some(target) = &self.target {
            body.insert("entity_id".into(), Value::String(target.to_string()));
        }
        body
    }
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)?;
        if let Some(target) = &self.target {
            write!(f, "({target})")?;
        }
        Ok(())
    }
}

// ── HubApi ──────────────────────────────────────────────────────────

/// Operations the engine needs from the hub.
#[async_trait]
pub trait HubApi: Send + Sync {
    /// Connectivity and authentication probe.
    async fn check_connection(&self) -> Result<(), CoreError>;

    /// Every entity the hub knows.
    async fn fetch_states(&self) -> Result<Vec<Entity>, CoreError>;

    /// Area, device and entity registry snapshot.
    async fn fetch_registry(&self) -> Result<Registry, CoreError>;

    async fn call_service(&self, call: &ServiceCall) -> Result<(), CoreError>;
}

// ── RestHub ─────────────────────────────────────────────────────────

/// `HubApi` over the hub's REST API.
pub struct RestHub {
    client: HassClient,
}

impl RestHub {
    pub fn new(client: HassClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ControllerConfig) -> Result<Self, CoreError> {
        let client = HassClient::new(config.url.clone(), &config.token, &config.transport())?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HubApi for RestHub {
    async fn check_connection(&self) -> Result<(), CoreError> {
        self.client.check_api().await.map_err(CoreError::from)
    }

    async fn fetch_states(&self) -> Result<Vec<Entity>, CoreError> {
        let states = self.client.get_states().await?;
        Ok(states.into_iter().map(Entity::from).collect())
    }

    async fn fetch_registry(&self) -> Result<Registry, CoreError> {
        let dump = self.client.get_registry().await?;
        Ok(Registry::from(dump))
    }

    async fn call_service(&self, call: &ServiceCall) -> Result<(), CoreError> {
        debug!(%call, "calling hub service");
        let changed = self
            .client
            .call_service(&call.domain, &call.service, &call.payload())
            .await?;
        debug!(changed = changed.len(), "service call accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_includes_target() {
        let call = ServiceCall::for_entity(&"cover.garage".into(), "set_cover_position")
            .with_data("position", 75);
        assert_eq!(call.domain, "cover");
        assert_eq!(
            Value::Object(call.payload()),
            json!({"entity_id": "cover.garage", "position": 75})
        );
        assert_eq!(call.to_string(), "cover.set_cover_position(cover.garage)");
    }

    #[test]
    fn untargeted_call_has_bare_payload() {
        let call = ServiceCall::new("notify", "mobile_app").with_data("message", "hi");
        assert_eq!(Value::Object(call.payload()), json!({"message": "hi"}));
    }
}
