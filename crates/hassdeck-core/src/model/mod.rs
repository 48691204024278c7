// ── Domain model ──
//
// Canonical representation of hub entities, the registry lookups that
// place them in areas and devices, and the user preference bundle.

pub mod control;
pub mod entity;
pub mod entity_id;
pub mod feature;
pub mod preferences;
pub mod registry;

pub use control::ControlField;
pub use entity::{Entity, EntityRef};
pub use entity_id::{Category, EntityId};
pub use feature::{Feature, FeatureSet};
pub use preferences::{
    DEFAULT_REFRESH_INTERVAL_SECS, PreferenceBundle, PreferencePart, Settings, SettingsPatch,
};
pub use registry::{Area, Device, EntityCategory, EntityLink, Registry};
