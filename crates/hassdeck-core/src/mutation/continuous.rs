// ── Continuous controls ──
//
// Sliders and dials: input only moves a local working value, then a
// commit trigger sends exactly one command carrying the final value.
// Until the hub echoes it, a pending marker keeps polls from snapping
// the field back.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::MutationContext;
use crate::error::CoreError;
use crate::hub::ServiceCall;
use crate::model::{ControlField, EntityId, Feature};
use crate::store::{PendingMarker, StoreAction, field_value};

/// When a continuous control sends its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    /// After no input has arrived for the given time.
    IdleTimeout(Duration),
    /// On an explicit [`ContinuousControl::release`].
    Release,
}

/// One control surface bound to one entity field.
///
/// Dropping the control cancels any armed timer and clears its marker.
/// Requires a tokio runtime for `IdleTimeout` triggers.
pub struct ContinuousControl {
    inner: Arc<ControlInner>,
}

struct ControlInner {
    ctx: MutationContext,
    entity_id: EntityId,
    field: ControlField,
    trigger: CommitTrigger,
    tolerance: f64,
    working: Mutex<Option<f64>>,
    timer: Mutex<Option<CancellationToken>>,
    lifetime: CancellationToken,
}

impl ContinuousControl {
    /// Bind a control to `field` of `entity_id`.
    ///
    /// Fails if the entity is unknown or cannot take this field.
    pub fn new(
        ctx: MutationContext,
        entity_id: EntityId,
        field: ControlField,
        trigger: CommitTrigger,
        tolerance: f64,
    ) -> Result<Self, CoreError> {
        let entity = ctx
            .store
            .entity(&entity_id)
            .ok_or_else(|| CoreError::EntityNotFound {
                entity_id: entity_id.clone(),
            })?;

        let required = match field {
            ControlField::Temperature => Feature::ClimateTargetTemperature,
            ControlField::CoverPosition => Feature::CoverSetPosition,
            ControlField::CoverTilt => Feature::CoverSetTiltPosition,
            ControlField::FanSpeed => Feature::FanSetSpeed,
            ControlField::ValvePosition => Feature::ValveSetPosition,
        };
        if entity.category() != Some(field.category()) || !entity.features().permits(required) {
            return Err(CoreError::UnsupportedAction {
                action: format!("set {field}"),
                entity_id,
                category: entity.category(),
            });
        }

        Ok(Self {
            inner: Arc::new(ControlInner {
                ctx,
                entity_id,
                field,
                trigger,
                tolerance: if field.is_tolerance_banded() {
                    tolerance
                } else {
                    0.0
                },
                working: Mutex::new(None),
                timer: Mutex::new(None),
                lifetime: CancellationToken::new(),
            }),
        })
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.inner.entity_id
    }

    pub fn field(&self) -> ControlField {
        self.inner.field
    }

    pub fn trigger(&self) -> CommitTrigger {
        self.inner.trigger
    }

    /// The value the control should display: working value, else the store's.
    pub fn value(&self) -> Option<f64> {
        (*self.inner.working.lock().unwrap_or_else(PoisonError::into_inner)).or_else(|| {
            self.inner
                .ctx
                .store
                .entity(&self.inner.entity_id)
                .and_then(|e| e.attribute_f64(self.inner.field.attribute()))
        })
    }

    /// Record a new working value. Never contacts the hub directly.
    pub fn input(&self, value: f64) -> Result<(), CoreError> {
        if !value.is_finite() {
            return Err(CoreError::InvalidValue {
                message: format!("{} must be a finite number", self.inner.field),
            });
        }
        let value = match self.inner.field.range() {
            Some((lo, hi)) => value.clamp(lo, hi),
            None => value,
        };
        *self.inner.working.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);

        if let CommitTrigger::IdleTimeout(delay) = self.inner.trigger {
            self.arm_timer(delay);
        }
        Ok(())
    }

    /// Explicit commit event (pointer release).
    ///
    /// Commits immediately for `Release` controls; idle-timeout controls
    /// ignore it and wait for their timer.
    pub async fn release(&self) -> Result<(), CoreError> {
        match self.inner.trigger {
            CommitTrigger::Release => self.inner.commit().await,
            CommitTrigger::IdleTimeout(_) => Ok(()),
        }
    }

    /// Cancel the armed timer and drop this control's marker.
    ///
    /// A commit already in flight still reverts if it fails.
    pub fn teardown(&self) {
        if self.inner.lifetime.is_cancelled() {
            return;
        }
        self.inner.lifetime.cancel();
        self.inner.ctx.store.dispatch(StoreAction::ClearPending {
            entity_id: self.inner.entity_id.clone(),
            field: self.inner.field,
            revert: false,
        });
        debug!(entity = %self.inner.entity_id, field = %self.inner.field, "control torn down");
    }

    fn arm_timer(&self, delay: Duration) {
        let token = self.inner.lifetime.child_token();
        let previous = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if let Err(e) = inner.commit().await {
                        warn!(entity = %inner.entity_id, field = %inner.field, error = %e, "idle commit failed");
                    }
                }
            }
        });
    }
}

impl Drop for ContinuousControl {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl ControlInner {
    /// Send the working value, if any, as one command.
    async fn commit(&self) -> Result<(), CoreError> {
        if self.lifetime.is_cancelled() {
            return Ok(());
        }
        let Some(value) = self
            .working
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Ok(());
        };

        let store = &self.ctx.store;
        let state = store.snapshot();
        let entity = state
            .entity(&self.entity_id)
            .ok_or_else(|| CoreError::EntityNotFound {
                entity_id: self.entity_id.clone(),
            })?;
        // Keep the value confirmed before the first uncommitted edit.
        let confirmed = match state.pending(&self.entity_id, self.field) {
            Some(marker) => marker.confirmed,
            None => entity.attribute_f64(self.field.attribute()),
        };

        let seq = self.ctx.sequencer.next(&self.entity_id);
        store.dispatch(StoreAction::SetPending {
            entity_id: self.entity_id.clone(),
            field: self.field,
            marker: PendingMarker {
                value,
                confirmed,
                tolerance: self.tolerance,
                seq,
            },
        });

        let (service, key) = self.field.service();
        let call = ServiceCall::for_entity(&self.entity_id, service)
            .with_data(key, field_value(self.field, value));

        match self.ctx.hub.call_service(&call).await {
            Ok(()) => {
                debug!(%call, value, seq, "control committed");
                Ok(())
            }
            Err(e) => {
                if self.ctx.sequencer.is_latest(&self.entity_id, seq) {
                    warn!(%call, error = %e, "commit failed, reverting to confirmed value");
                    let cleared = store.dispatch(StoreAction::ClearPending {
                        entity_id: self.entity_id.clone(),
                        field: self.field,
                        revert: true,
                    });
                    // Torn down mid-flight: the marker is gone but the
                    // committed value may still be showing.
                    if !cleared {
                        self.restore(value, confirmed);
                    }
                } else {
                    warn!(%call, error = %e, seq, "stale commit failed, newer command owns the field");
                }
                Err(e)
            }
        }
    }

    /// Put `confirmed` back if the field still shows `committed`.
    fn restore(&self, committed: f64, confirmed: Option<f64>) {
        let Some(confirmed) = confirmed else {
            return;
        };
        let Some(entity) = self.ctx.store.entity(&self.entity_id) else {
            return;
        };
        let showing = entity.attribute_f64(self.field.attribute());
        if showing.is_some_and(|v| (v - committed).abs() < 1e-9) {
            self.ctx.store.dispatch(StoreAction::UpdateEntity(
                entity.with_attribute(self.field.attribute(), field_value(self.field, confirmed)),
            ));
        }
    }
}
