// ── Area / device registry ──
//
// Lookup tables rebuilt wholesale from each registry snapshot.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::EntityId;

/// Registry classification of a non-primary entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: Option<String>,
    pub area_id: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// Registry links of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityLink {
    pub area_id: Option<String>,
    pub device_id: Option<String>,
    pub entity_category: Option<EntityCategory>,
}

/// Entity → area and entity → device lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    areas: BTreeMap<String, Area>,
    devices: HashMap<String, Device>,
    entities: HashMap<EntityId, EntityLink>,
}

impl Registry {
    pub fn new(
        areas: impl IntoIterator<Item = Area>,
        devices: impl IntoIterator<Item = Device>,
        entities: impl IntoIterator<Item = (EntityId, EntityLink)>,
    ) -> Self {
        Self {
            areas: areas.into_iter().map(|a| (a.id.clone(), a)).collect(),
            devices: devices.into_iter().map(|d| (d.id.clone(), d)).collect(),
            entities: entities.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty() && self.devices.is_empty() && self.entities.is_empty()
    }

    pub fn areas(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    pub fn area(&self, area_id: &str) -> Option<&Area> {
        self.areas.get(area_id)
    }

    /// Area display name; unknown ids fall back to the id itself.
    pub fn area_name<'a>(&'a self, area_id: &'a str) -> &'a str {
        self.areas.get(area_id).map_or(area_id, |a| a.name.as_str())
    }

    /// Look up an area by id or by case-insensitive name.
    pub fn find_area(&self, needle: &str) -> Option<&Area> {
        self.areas.get(needle).or_else(|| {
            self.areas
                .values()
                .find(|a| a.name.eq_ignore_ascii_case(needle))
        })
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn device_of(&self, entity_id: &EntityId) -> Option<&str> {
        self.entities
            .get(entity_id)
            .and_then(|l| l.device_id.as_deref())
    }

    /// The entity's own area, falling back to its device's area.
    ///
    /// Ids that name no known area are skipped, so an entity pointing at a
    /// deleted area ends up unassigned.
    pub fn area_of(&self, entity_id: &EntityId) -> Option<&str> {
        let link = self.entities.get(entity_id)?;
        let device_area = link
            .device_id
            .as_deref()
            .and_then(|d| self.devices.get(d))
            .and_then(|d| d.area_id.as_deref());
        [link.area_id.as_deref(), device_area]
            .into_iter()
            .flatten()
            .find(|id| self.areas.contains_key(*id))
    }

    pub fn entity_category(&self, entity_id: &EntityId) -> Option<EntityCategory> {
        self.entities.get(entity_id).and_then(|l| l.entity_category)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
