// ── Collection partitioning and poll reconciliation ──

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use strum::EnumCount;
use tracing::debug;

use super::state::{EntityList, PendingKey, PendingMarker};
use crate::model::{Category, ControlField, Entity};

/// Split the raw list into one collection per category, in one pass.
pub(crate) fn partition(entities: &[Arc<Entity>]) -> [EntityList; Category::COUNT] {
    let mut buckets: [Vec<Arc<Entity>>; Category::COUNT] = std::array::from_fn(|_| Vec::new());
    for entity in entities {
        if let Some(category) = entity.category() {
            buckets[category.index()].push(Arc::clone(entity));
        }
    }
    buckets.map(Arc::new)
}

/// Recompute the collection of a single category.
pub(crate) fn collect_category(entities: &[Arc<Entity>], category: Category) -> EntityList {
    Arc::new(
        entities
            .iter()
            .filter(|e| e.category() == Some(category))
            .cloned()
            .collect(),
    )
}

/// JSON value for a control field, integral where the hub expects it.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn field_value(field: ControlField, value: f64) -> Value {
    if field.is_integral() && value.fract() == 0.0 {
        return Value::from(value as i64);
    }
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Copy of `entity` showing `value` in the field's attribute.
pub(crate) fn overlay(entity: &Entity, field: ControlField, value: f64) -> Entity {
    entity.with_attribute(field.attribute(), field_value(field, value))
}

/// Apply pending markers to a fresh poll.
///
/// A polled value that matches its marker confirms it and the marker is
/// dropped. Otherwise the pending value stays visible. Markers of
/// entities missing from the poll are dropped.
pub(crate) fn reconcile_poll(
    incoming: Vec<Entity>,
    pending: &BTreeMap<PendingKey, PendingMarker>,
) -> (Vec<Arc<Entity>>, BTreeMap<PendingKey, PendingMarker>) {
    if pending.is_empty() {
        return (incoming.into_iter().map(Arc::new).collect(), BTreeMap::new());
    }

    let mut still_pending = BTreeMap::new();
    let entities = incoming
        .into_iter()
        .map(|mut entity| {
            for (key, marker) in pending.range(range_for(&entity)) {
                match entity.attribute_f64(key.field.attribute()) {
                    Some(polled) if marker.matches(polled) => {
                        debug!(entity = %key.entity_id, field = %key.field, polled, "pending value confirmed");
                    }
                    _ => {
                        entity = overlay(&entity, key.field, marker.value);
                        still_pending.insert(key.clone(), marker.clone());
                    }
                }
            }
            Arc::new(entity)
        })
        .collect();

    (entities, still_pending)
}

fn range_for(entity: &Entity) -> std::ops::RangeInclusive<PendingKey> {
    PendingKey {
        entity_id: entity.entity_id.clone(),
        field: ControlField::Temperature,
    }..=PendingKey {
        entity_id: entity.entity_id.clone(),
        field: ControlField::ValvePosition,
    }
}
