// ── Store snapshot ──
//
// One immutable snapshot of everything the store holds. Every part is
// behind its own `Arc`, so a transition that touches one part shares
// the rest with the previous snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::EnumCount;

use crate::model::{Category, ControlField, Entity, EntityId, Registry, Settings};

pub type EntityList = Arc<Vec<Arc<Entity>>>;

// ── Pending markers ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingKey {
    pub entity_id: EntityId,
    pub field: ControlField,
}

/// A committed value the hub has not echoed back yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMarker {
    /// Value sent to the hub.
    pub value: f64,
    /// Last value the hub confirmed, restored if the command fails.
    pub confirmed: Option<f64>,
    /// Accepted drift between `value` and the polled value.
    pub tolerance: f64,
    /// Sequence number of the command that set the marker.
    pub seq: u64,
}

impl PendingMarker {
    pub fn matches(&self, polled: f64) -> bool {
        (polled - self.value).abs() <= self.tolerance.max(1e-6)
    }
}

// ── StoreState ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoreState {
    pub(crate) entities: EntityList,
    pub(crate) collections: [EntityList; Category::COUNT],
    pub(crate) hidden_entities: Arc<BTreeSet<EntityId>>,
    pub(crate) hidden_rooms: Arc<BTreeSet<String>>,
    pub(crate) custom_names: Arc<BTreeMap<EntityId, String>>,
    pub(crate) settings: Arc<Settings>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) pending: Arc<BTreeMap<PendingKey, PendingMarker>>,
    pub(crate) last_refresh: Option<DateTime<Utc>>,
    pub(crate) error: Option<String>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            entities: Arc::default(),
            collections: std::array::from_fn(|_| Arc::default()),
            hidden_entities: Arc::default(),
            hidden_rooms: Arc::default(),
            custom_names: Arc::default(),
            settings: Arc::default(),
            registry: Arc::default(),
            pending: Arc::default(),
            last_refresh: None,
            error: None,
        }
    }
}

impl StoreState {
    // ── Entities ─────────────────────────────────────────────────────

    /// Every entity from the last poll, recognized category or not.
    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    /// The typed collection of one category.
    pub fn collection(&self, category: Category) -> &EntityList {
        &self.collections[category.index()]
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Arc<Entity>> {
        self.entities.iter().find(|e| &e.entity_id == id)
    }

    pub fn lights(&self) -> &EntityList {
        self.collection(Category::Light)
    }

    pub fn switches(&self) -> &EntityList {
        self.collection(Category::Switch)
    }

    pub fn sensors(&self) -> &EntityList {
        self.collection(Category::Sensor)
    }

    pub fn binary_sensors(&self) -> &EntityList {
        self.collection(Category::BinarySensor)
    }

    pub fn climate(&self) -> &EntityList {
        self.collection(Category::Climate)
    }

    pub fn locks(&self) -> &EntityList {
        self.collection(Category::Lock)
    }

    pub fn covers(&self) -> &EntityList {
        self.collection(Category::Cover)
    }

    pub fn fans(&self) -> &EntityList {
        self.collection(Category::Fan)
    }

    pub fn valves(&self) -> &EntityList {
        self.collection(Category::Valve)
    }

    pub fn vacuums(&self) -> &EntityList {
        self.collection(Category::Vacuum)
    }

    pub fn alarms(&self) -> &EntityList {
        self.collection(Category::AlarmControlPanel)
    }

    pub fn automations(&self) -> &EntityList {
        self.collection(Category::Automation)
    }

    pub fn scripts(&self) -> &EntityList {
        self.collection(Category::Script)
    }

    pub fn cameras(&self) -> &EntityList {
        self.collection(Category::Camera)
    }

    pub fn calendars(&self) -> &EntityList {
        self.collection(Category::Calendar)
    }

    pub fn weather(&self) -> &EntityList {
        self.collection(Category::Weather)
    }

    pub fn people(&self) -> &EntityList {
        self.collection(Category::Person)
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub fn hidden_entities(&self) -> &BTreeSet<EntityId> {
        &self.hidden_entities
    }

    pub fn hidden_rooms(&self) -> &BTreeSet<String> {
        &self.hidden_rooms
    }

    pub fn custom_names(&self) -> &BTreeMap<EntityId, String> {
        &self.custom_names
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Custom name, then the hub's friendly name, then the raw id.
    pub fn display_name<'a>(&'a self, entity: &'a Entity) -> &'a str {
        self.custom_names
            .get(&entity.entity_id)
            .map(String::as_str)
            .or_else(|| entity.friendly_name())
            .unwrap_or_else(|| entity.entity_id.as_str())
    }

    // ── Registry / bookkeeping ───────────────────────────────────────

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn pending(&self, entity_id: &EntityId, field: ControlField) -> Option<&PendingMarker> {
        self.pending.get(&PendingKey {
            entity_id: entity_id.clone(),
            field,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// How long ago the last successful poll landed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh.map(|t| Utc::now() - t)
    }

    /// Recoverable error from the last failed poll, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
