// ── Entity identity ──
//
// Every hub entity is addressed as `<category>.<slug>`. The prefix
// decides the typed collection and the control semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical `<category>.<slug>` identifier.
///
/// Ids with an unrecognized or missing prefix are still valid ids; they
/// simply have no [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The prefix before the first `.`, if the id has both halves.
    pub fn domain(&self) -> Option<&str> {
        match self.0.split_once('.') {
            Some((domain, slug)) if !domain.is_empty() && !slug.is_empty() => Some(domain),
            _ => None,
        }
    }

    /// The part after the first `.`.
    pub fn slug(&self) -> Option<&str> {
        self.domain().and_then(|_| self.0.split_once('.')).map(|(_, slug)| slug)
    }

    pub fn category(&self) -> Option<Category> {
        self.domain().and_then(|d| d.parse().ok())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Entity categories with a typed collection in the store.
///
/// The string form is the hub's domain prefix.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
    EnumCount,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Light,
    Switch,
    Sensor,
    Climate,
    Lock,
    Cover,
    Fan,
    Valve,
    Vacuum,
    AlarmControlPanel,
    Automation,
    Script,
    Camera,
    Calendar,
    Weather,
    Person,
    BinarySensor,
}

impl Category {
    /// Position of this category's collection in the store.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Ordering used when listing entities of one device:
    /// controllable types first, read-only sensors last.
    pub fn priority(self) -> u8 {
        match self {
            Self::Light => 0,
            Self::Switch => 1,
            Self::Fan => 2,
            Self::Cover => 3,
            Self::Climate => 4,
            Self::Lock => 5,
            Self::Valve => 6,
            Self::Vacuum => 7,
            Self::AlarmControlPanel => 8,
            Self::Camera => 9,
            Self::Script => 10,
            Self::Automation => 11,
            Self::Weather => 12,
            Self::Calendar => 13,
            Self::Person => 14,
            Self::BinarySensor => 15,
            Self::Sensor => 16,
        }
    }

    /// Plural collection name, as shown to users.
    pub fn collection_name(self) -> &'static str {
        match self {
            Self::Light => "lights",
            Self::Switch => "switches",
            Self::Sensor => "sensors",
            Self::Climate => "climate",
            Self::Lock => "locks",
            Self::Cover => "covers",
            Self::Fan => "fans",
            Self::Valve => "valves",
            Self::Vacuum => "vacuums",
            Self::AlarmControlPanel => "alarms",
            Self::Automation => "automations",
            Self::Script => "scripts",
            Self::Camera => "cameras",
            Self::Calendar => "calendars",
            Self::Weather => "weather",
            Self::Person => "people",
            Self::BinarySensor => "binary sensors",
        }
    }

    /// Read-only categories subject to the noise filter.
    pub fn is_sensor_like(self) -> bool {
        matches!(self, Self::Sensor | Self::BinarySensor)
    }
}
