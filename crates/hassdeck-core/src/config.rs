// ── Runtime connection configuration ──
//
// These types describe how to reach a hub and how the engine behaves.
// They carry credential data and tuning knobs, but never touch disk.
// The CLI builds a `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use hassdeck_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed hubs on the LAN).
    DangerAcceptInvalid,
}

/// Where the remote preference store lives, if anywhere.
#[derive(Debug, Clone)]
pub struct PreferenceStoreConfig {
    pub url: Url,
    pub token: Option<SecretString>,
}

/// Configuration for one hub connection.
///
/// Built by the CLI, passed to `Controller`; core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Hub URL (e.g., `http://homeassistant.local:8123`).
    pub url: Url,
    /// Long-lived access token.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Fallback polling interval when the settings carry 0. 0 here disables polling.
    pub refresh_interval_secs: u64,
    /// Minimum age of the registry snapshot before it is fetched again.
    pub registry_ttl: Duration,
    /// Idle time before a temperature control commits.
    pub temperature_debounce: Duration,
    /// Accepted drift between a committed position/tilt and the polled value.
    pub position_tolerance: f64,
    /// Remote preference store; `None` keeps preferences local only.
    pub preferences: Option<PreferenceStoreConfig>,
}

impl ControllerConfig {
    /// Configuration with default tuning for the given hub.
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            refresh_interval_secs: 30,
            registry_ttl: Duration::from_secs(300),
            temperature_debounce: Duration::from_secs(3),
            position_tolerance: 2.0,
            preferences: None,
        }
    }

    /// Transport settings shared by the hub and preference store clients.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
