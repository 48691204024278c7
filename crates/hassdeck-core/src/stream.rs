// ── Reactive store streams ──
//
// Subscription type for consuming store snapshots.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::StoreState;

/// A subscription to the entity store.
///
/// Offers point-in-time snapshot access and change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct StateStream {
    current: Arc<StoreState>,
    receiver: watch::Receiver<Arc<StoreState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<StoreState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &Arc<StoreState> {
        &self.current
    }

    /// The latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> Arc<StoreState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<StoreState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    /// The first item is the snapshot current at subscription time.
    pub fn into_stream(self) -> StoreWatchStream {
        StoreWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the store's `watch::Receiver`.
pub struct StoreWatchStream {
    inner: WatchStream<Arc<StoreState>>,
}

impl Stream for StoreWatchStream {
    type Item = Arc<StoreState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use crate::model::Entity;
    use crate::store::{EntityStore, StoreAction};

    #[tokio::test]
    async fn changed_yields_new_snapshot() {
        let store = EntityStore::new();
        let mut stream = store.subscribe();
        assert!(stream.current().entities().is_empty());

        store.dispatch(StoreAction::ReplaceAll(vec![Entity::new("light.a", "on")]));
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.lights().len(), 1);
        assert_eq!(stream.current().lights().len(), 1);
    }

    #[tokio::test]
    async fn noop_dispatch_does_not_notify() {
        let store = EntityStore::new();
        let stream = store.subscribe();
        store.dispatch(StoreAction::ClearError);
        assert!(!stream.receiver.has_changed().unwrap());
    }

    #[tokio::test]
    async fn stream_starts_with_current_snapshot() {
        let store = EntityStore::new();
        store.dispatch(StoreAction::HideRoom("garage".into()));
        let mut stream = store.subscribe().into_stream();
        let first = stream.next().await.unwrap();
        assert!(first.hidden_rooms().contains("garage"));
    }
}
