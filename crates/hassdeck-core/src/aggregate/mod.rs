// ── Area / device aggregation ──
//
// Pure derivations over one store snapshot: entities grouped by area for
// the dashboard, and the other entities of a device.

mod filter;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use strum::IntoEnumIterator;

pub use filter::NoiseFilter;

use crate::model::{Category, Entity, EntityId};
use crate::store::StoreState;

/// Name of the synthetic group for entities without an area.
pub const UNASSIGNED: &str = "Unassigned";

/// One area and its visible members, per category.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaGroup {
    /// `None` for the unassigned group.
    pub area_id: Option<String>,
    pub name: String,
    /// The area is in the hidden-room set (only visible in edit mode).
    pub hidden: bool,
    /// Members per category, each list sorted by display name.
    pub categories: BTreeMap<Category, Vec<Arc<Entity>>>,
    /// Members removed by the noise filter alone.
    pub filtered_count: usize,
}

impl AreaGroup {
    fn new(area_id: Option<String>, name: String, hidden: bool) -> Self {
        Self {
            area_id,
            name,
            hidden,
            categories: BTreeMap::new(),
            filtered_count: 0,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.area_id.is_none()
    }

    pub fn entity_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.categories.values().flatten()
    }
}

/// Group every typed entity by area.
///
/// Outside edit mode hidden rooms, hidden entities and noise are left out.
/// Edit mode shows everything so the user can un-hide it.
pub fn area_groups(state: &StoreState, edit_mode: bool, noise: &NoiseFilter) -> Vec<AreaGroup> {
    let registry = state.registry();
    let mut groups: BTreeMap<Option<&str>, AreaGroup> = BTreeMap::new();

    for category in Category::iter() {
        for entity in state.collection(category).iter() {
            let area_id = registry.area_of(&entity.entity_id);
            let room_hidden = area_id.is_some_and(|a| state.hidden_rooms().contains(a));

            if !edit_mode
                && (room_hidden || state.hidden_entities().contains(&entity.entity_id))
            {
                continue;
            }

            let group = groups.entry(area_id).or_insert_with(|| match area_id {
                Some(id) => AreaGroup::new(
                    Some(id.to_owned()),
                    registry.area_name(id).to_owned(),
                    room_hidden,
                ),
                None => AreaGroup::new(None, UNASSIGNED.to_owned(), false),
            });

            if !edit_mode && noise.is_noise(entity, registry) {
                group.filtered_count += 1;
                continue;
            }
            group
                .categories
                .entry(category)
                .or_default()
                .push(Arc::clone(entity));
        }
    }

    let mut out: Vec<AreaGroup> = groups
        .into_values()
        .filter(|g| g.entity_count() > 0)
        .collect();

    for group in &mut out {
        for members in group.categories.values_mut() {
            members.sort_by_cached_key(|e| state.display_name(e).to_lowercase());
        }
    }
    out.sort_by(compare_groups);
    out
}

fn compare_groups(a: &AreaGroup, b: &AreaGroup) -> Ordering {
    match (a.is_unassigned(), b.is_unassigned()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.area_id.cmp(&b.area_id)),
    }
}

/// Other entities on the same device, controllable types first.
///
/// Siblings with an unrecognized prefix are kept and sort last.
pub fn related_entities(state: &StoreState, entity_id: &EntityId) -> Vec<Arc<Entity>> {
    let registry = state.registry();
    let Some(device) = registry.device_of(entity_id) else {
        return Vec::new();
    };

    let mut related: Vec<(u8, String, Arc<Entity>)> = state
        .entities()
        .iter()
        .filter(|e| e.entity_id != *entity_id)
        .filter(|e| registry.device_of(&e.entity_id) == Some(device))
        .map(|e| {
            let priority = e.category().map_or(u8::MAX, Category::priority);
            (priority, state.display_name(e).to_lowercase(), Arc::clone(e))
        })
        .collect();

    related.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    related.into_iter().map(|(_, _, e)| e).collect()
}
