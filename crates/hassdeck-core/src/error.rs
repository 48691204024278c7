// ── Core error types ──
//
// User-facing errors from hassdeck-core. Consumers never see raw HTTP
// status codes or JSON parse failures; `From<hassdeck_api::Error>`
// translates transport failures into domain variants.

use thiserror::Error;

use crate::model::{Category, EntityId};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to hub at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Hub not connected")]
    Disconnected,

    #[error("Hub request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: EntityId },

    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Action '{action}' is not supported by {entity_id}")]
    UnsupportedAction {
        action: String,
        entity_id: EntityId,
        category: Option<Category>,
    },

    #[error("Hub rejected the command: {message}")]
    CommandRejected {
        message: String,
        status: Option<u16>,
    },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Preference sync failed: {message}")]
    Sync { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for failures that should move the connection to its error state.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::Disconnected
                | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hassdeck_api::Error> for CoreError {
    fn from(err: hassdeck_api::Error) -> Self {
        match err {
            hassdeck_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            hassdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::CommandRejected {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            hassdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            hassdeck_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            hassdeck_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            hassdeck_api::Error::Http { status: 404, message } => {
                CoreError::NotFound { identifier: message }
            }
            hassdeck_api::Error::Http { status, message } => CoreError::CommandRejected {
                message,
                status: Some(status),
            },
            hassdeck_api::Error::UnexpectedResponse { endpoint, message } => {
                CoreError::ConnectionFailed {
                    url: endpoint,
                    reason: message,
                }
            }
            hassdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_maps_to_connection_error() {
        let err = CoreError::from(hassdeck_api::Error::Authentication {
            message: "bad token".into(),
        });
        assert!(err.is_connection_error());
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn http_status_maps_to_rejection() {
        let err = CoreError::from(hassdeck_api::Error::Http {
            status: 400,
            message: "invalid service data".into(),
        });
        match err {
            CoreError::CommandRejected { status, .. } => assert_eq!(status, Some(400)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unsupported_action_message_names_entity() {
        let err = CoreError::UnsupportedAction {
            action: "lock".into(),
            entity_id: EntityId::from("light.kitchen"),
            category: Some(Category::Light),
        };
        assert_eq!(
            err.to_string(),
            "Action 'lock' is not supported by light.kitchen"
        );
    }
}
