// ── Optimistic mutations ──
//
// Discrete actions and continuous controls share one store, one hub
// and one per-entity sequencer.

mod action;
mod continuous;
mod discrete;
mod sequence;

use std::sync::Arc;

pub use action::{ActionPlan, EntityAction, plan};
pub use continuous::{CommitTrigger, ContinuousControl};
pub use discrete::DiscreteMutator;
pub use sequence::CommandSequencer;

use crate::hub::HubApi;
use crate::store::EntityStore;

/// Everything a mutation needs to write state and reach the hub.
#[derive(Clone)]
pub struct MutationContext {
    pub(crate) store: Arc<EntityStore>,
    pub(crate) hub: Arc<dyn HubApi>,
    pub(crate) sequencer: Arc<CommandSequencer>,
}

impl MutationContext {
    pub fn new(store: Arc<EntityStore>, hub: Arc<dyn HubApi>) -> Self {
        Self {
            store,
            hub,
            sequencer: Arc::new(CommandSequencer::new()),
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }
}
