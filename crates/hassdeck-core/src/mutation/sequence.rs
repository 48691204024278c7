// ── Per-entity command sequencing ──
//
// Every command to an entity takes the next number for that entity. A
// failure only rolls back state if no newer command was issued since.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::model::EntityId;

#[derive(Debug, Default)]
pub struct CommandSequencer {
    latest: Mutex<HashMap<EntityId, u64>>,
}

impl CommandSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next sequence number for `entity_id`.
    pub fn next(&self, entity_id: &EntityId) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = latest.entry(entity_id.clone()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// `true` if `seq` is still the newest command for `entity_id`.
    pub fn is_latest(&self, entity_id: &EntityId, seq: u64) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .is_some_and(|latest| *latest == seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_command_supersedes() {
        let seq = CommandSequencer::new();
        let id = EntityId::from("lock.front");
        let first = seq.next(&id);
        assert!(seq.is_latest(&id, first));
        let second = seq.next(&id);
        assert!(!seq.is_latest(&id, first));
        assert!(seq.is_latest(&id, second));
    }

    #[test]
    fn entities_are_sequenced_independently() {
        let seq = CommandSequencer::new();
        let a = seq.next(&EntityId::from("light.a"));
        seq.next(&EntityId::from("light.b"));
        assert!(seq.is_latest(&EntityId::from("light.a"), a));
    }
}
