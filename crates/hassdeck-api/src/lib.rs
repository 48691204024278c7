// hassdeck-api: Async Rust clients for the Home Assistant REST API and the
// remote preference store.
//
// This crate only speaks wire formats. Domain semantics (categories,
// reconciliation, preference precedence) live in `hassdeck-core`.

pub mod client;
pub mod error;
pub mod models;
pub mod prefs;
pub mod registry;
pub mod transport;

pub use client::HassClient;
pub use error::Error;
pub use models::{HassState, RegistryArea, RegistryDevice, RegistryDump, RegistryEntity};
pub use prefs::PrefsClient;
pub use transport::{TlsMode, TransportConfig};
