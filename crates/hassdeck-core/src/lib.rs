// hassdeck-core: Entity state synchronization engine between hassdeck-api
// and consumers (CLI, dashboards).

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod hub;
pub mod model;
pub mod mutation;
pub mod preferences;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{AreaGroup, NoiseFilter, area_groups, related_entities};
pub use cache::TtlCache;
pub use config::{ControllerConfig, PreferenceStoreConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use hub::{HubApi, RestHub, ServiceCall};
pub use mutation::{
    CommitTrigger, ContinuousControl, DiscreteMutator, EntityAction, MutationContext,
};
pub use preferences::{
    JsonFileStore, LocalStore, MemoryStore, PreferenceBackend, PreferenceSync, RemoteBundle,
    RemotePrefs,
};
pub use store::{EntityStore, StoreAction, StoreState};
pub use stream::StateStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Entities
    Category, ControlField, Entity, EntityId, EntityRef, Feature, FeatureSet,
    // Registry
    Area, Device, EntityCategory, EntityLink, Registry,
    // Preferences
    PreferenceBundle, PreferencePart, Settings, SettingsPatch,
};
