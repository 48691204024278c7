//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hassdeck_config::ConfigError;
use hassdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to hub at {url}")]
    #[diagnostic(
        code(hassdeck::connection_failed),
        help(
            "Check that the hub is running and reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try: hassdeck status --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(hassdeck::auth_failed),
        help(
            "The hub rejected the access token.\n\
             Create a long-lived token under your hub user profile, then run:\n\
             hassdeck config set-token {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No access token configured for profile '{profile}'")]
    #[diagnostic(
        code(hassdeck::no_credentials),
        help(
            "Configure a token with: hassdeck config init\n\
             Or set the HASSDECK_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(hassdeck::not_found),
        help("Run: hassdeck {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Hub ──────────────────────────────────────────────────────────
    #[error("'{action}' is not supported by {entity_id}")]
    #[diagnostic(
        code(hassdeck::unsupported),
        help("The entity's category or reported features do not allow this action.")
    )]
    Unsupported { action: String, entity_id: String },

    #[error("Hub rejected the command: {message}")]
    #[diagnostic(code(hassdeck::rejected))]
    Rejected { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(hassdeck::timeout),
        help("Increase the timeout with --timeout or check hub responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("{message}")]
    #[diagnostic(code(hassdeck::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hassdeck::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(hassdeck::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: hassdeck config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(hassdeck::no_config),
        help(
            "Create one with: hassdeck config init\n\
             Expected at: {path}\n\
             Or pass --url and --token."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(hassdeck::config))]
    Config(Box<figment::Error>),

    #[error("Could not access the system keyring: {message}")]
    #[diagnostic(
        code(hassdeck::keyring),
        help("Set token_env on the profile instead: hassdeck config set token_env MY_VAR")
    )]
    Keyring { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Could not store preferences: {message}")]
    #[diagnostic(code(hassdeck::storage))]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(hassdeck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(hassdeck::json), help("Service data must be a JSON object."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::Json(_) => {
                exit_code::USAGE
            }
            Self::Unsupported { .. } | Self::Keyring { .. } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "<profile>".into(),
            },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                source: "Hub connection was lost".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::EntityNotFound { entity_id } => CliError::NotFound {
                resource_type: "entity".into(),
                identifier: entity_id.to_string(),
                list_command: "entities".into(),
            },

            CoreError::NotFound { identifier } => CliError::NotFound {
                resource_type: "resource".into(),
                identifier,
                list_command: "status".into(),
            },

            CoreError::UnsupportedAction {
                action,
                entity_id,
                category: _,
            } => CliError::Unsupported {
                action,
                entity_id: entity_id.to_string(),
            },

            CoreError::CommandRejected { message, status: _ } => CliError::Rejected { message },

            CoreError::InvalidValue { message } => CliError::Validation {
                field: "value".into(),
                reason: message,
            },

            CoreError::Storage { message } | CoreError::Sync { message } => {
                CliError::Storage { message }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(see: hassdeck config profiles)".into(),
            },
            ConfigError::Serialization(e) => CliError::Internal {
                message: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
