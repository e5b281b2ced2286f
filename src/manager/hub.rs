//! Status publication: current snapshot plus a registry of observers.
//!
//! Every observer owns an unbounded queue. Publishing and subscribing happen
//! under the same lock, so an observer receives the snapshot that was current
//! when it attached, followed by every later snapshot exactly once and in
//! order.

use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::status::ConnectionStatus;

pub(crate) struct StatusHub {
    inner: Mutex<HubState>,
}

struct HubState {
    current: ConnectionStatus,
    observers: Vec<mpsc::UnboundedSender<ConnectionStatus>>,
}

impl StatusHub {
    pub(crate) fn new(initial: ConnectionStatus) -> Self {
        Self {
            inner: Mutex::new(HubState {
                current: initial,
                observers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // The guarded data is a plain value; a panicking writer cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> ConnectionStatus {
        self.lock().current.clone()
    }

    pub(crate) fn subscribe(&self) -> StatusStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // Receiver is alive, send cannot fail.
        let _ = tx.send(state.current.clone());
        state.observers.push(tx);
        StatusStream { rx }
    }

    /// Apply `change` to a copy of the current snapshot and publish it.
    ///
    /// Returns the resulting snapshot. Nothing is published when `change`
    /// leaves the snapshot untouched.
    pub(crate) fn update<F>(&self, change: F) -> ConnectionStatus
    where
        F: FnOnce(&mut ConnectionStatus),
    {
        let mut state = self.lock();
        let mut next = state.current.clone();
        change(&mut next);
        if next != state.current {
            state.current = next.clone();
            state
                .observers
                .retain(|observer| observer.send(next.clone()).is_ok());
            tracing::trace!(status = %next, observers = state.observers.len(), "status published");
        }
        next
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }
}

/// Stream of [`ConnectionStatus`] snapshots for one observer.
///
/// Yields the snapshot current at subscription time first. Ends when the
/// owning [`ConnectionManager`](crate::manager::ConnectionManager) is dropped.
#[derive(Debug)]
pub struct StatusStream {
    rx: mpsc::UnboundedReceiver<ConnectionStatus>,
}

impl StatusStream {
    /// Wait for the next snapshot.
    pub async fn recv(&mut self) -> Option<ConnectionStatus> {
        self.rx.recv().await
    }

    /// Take the next snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<ConnectionStatus> {
        self.rx.try_recv().ok()
    }

    /// Drain every snapshot queued so far.
    pub fn drain(&mut self) -> Vec<ConnectionStatus> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Stream for StatusStream {
    type Item = ConnectionStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Phase;

    #[test]
    fn test_subscriber_gets_current_snapshot_first() {
        let hub = StatusHub::new(ConnectionStatus::default());
        hub.update(|s| s.bluetooth_ready = true);

        let mut stream = hub.subscribe();
        let first = stream.try_recv().unwrap();
        assert!(first.bluetooth_ready);
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_unchanged_update_is_not_published() {
        let hub = StatusHub::new(ConnectionStatus::default());
        let mut stream = hub.subscribe();
        stream.drain();

        hub.update(|s| s.phase = Phase::Idle);
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_late_subscriber_sees_only_later_updates() {
        let hub = StatusHub::new(ConnectionStatus::default());
        let mut early = hub.subscribe();

        hub.update(|s| s.bluetooth_ready = true);
        let mut late = hub.subscribe();
        hub.update(|s| s.phase = Phase::Scanning);

        let early: Vec<_> = early.drain().into_iter().map(|s| s.phase).collect();
        let late: Vec<_> = late.drain().into_iter().map(|s| s.phase).collect();
        assert_eq!(early, vec![Phase::Idle, Phase::Idle, Phase::Scanning]);
        assert_eq!(late, vec![Phase::Idle, Phase::Scanning]);
    }

    #[test]
    fn test_dropped_observers_are_pruned() {
        let hub = StatusHub::new(ConnectionStatus::default());
        let kept = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(hub.observer_count(), 2);

        hub.update(|s| s.bluetooth_ready = true);
        assert_eq!(hub.observer_count(), 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_stream_ends_with_hub() {
        use futures::StreamExt;

        let hub = StatusHub::new(ConnectionStatus::default());
        let mut stream = hub.subscribe();
        drop(hub);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }
}
