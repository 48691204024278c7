// ── Discrete optimistic mutations ──
//
// Write the expected end state, call the hub, and roll back to the
// pre-mutation snapshot if the call fails.

use tracing::{debug, warn};

use super::MutationContext;
use super::action::{EntityAction, plan};
use crate::error::CoreError;
use crate::hub::ServiceCall;
use crate::model::{Entity, EntityId};
use crate::store::StoreAction;

/// Executes one-shot commands (toggle, lock, arm, ...) optimistically.
#[derive(Clone)]
pub struct DiscreteMutator {
    ctx: MutationContext,
}

impl DiscreteMutator {
    pub fn new(ctx: MutationContext) -> Self {
        Self { ctx }
    }

    /// Run a vocabulary action against an entity.
    ///
    /// Invalid actions fail before the store is touched.
    pub async fn execute(&self, entity_id: &EntityId, action: EntityAction) -> Result<(), CoreError> {
        let entity = self.current(entity_id)?;
        let plan = plan(&entity, action)?;
        let optimistic = plan
            .expected_status
            .map(|status| entity.with_status(status));
        self.apply(entity_id, plan.call, optimistic).await
    }

    /// Issue an arbitrary call, optionally showing `optimistic` until it resolves.
    pub async fn apply(
        &self,
        entity_id: &EntityId,
        call: ServiceCall,
        optimistic: Option<Entity>,
    ) -> Result<(), CoreError> {
        let snapshot = self.current(entity_id)?;
        let seq = self.ctx.sequencer.next(entity_id);

        let wrote = match optimistic {
            Some(expected) => self.ctx.store.dispatch(StoreAction::UpdateEntity(expected)),
            None => false,
        };

        match self.ctx.hub.call_service(&call).await {
            Ok(()) => {
                debug!(%call, seq, "command accepted");
                Ok(())
            }
            Err(e) => {
                if !wrote {
                    warn!(%call, error = %e, "command failed");
                } else if self.ctx.sequencer.is_latest(entity_id, seq) {
                    warn!(%call, error = %e, "command failed, reverting optimistic state");
                    self.ctx
                        .store
                        .dispatch(StoreAction::UpdateEntity((*snapshot).clone()));
                } else {
                    warn!(%call, error = %e, seq, "stale command failed, newer command owns the state");
                }
                Err(e)
            }
        }
    }

    fn current(&self, entity_id: &EntityId) -> Result<std::sync::Arc<Entity>, CoreError> {
        self.ctx
            .store
            .entity(entity_id)
            .ok_or_else(|| CoreError::EntityNotFound {
                entity_id: entity_id.clone(),
            })
    }
}
