// ── Reactive state cells ──
//
// A single-writer value with two observation paths: a `watch` channel
// holding the current value, and a `broadcast` channel carrying every
// transition in publication order. Both are written under the watch
// lock, so a subscriber never sees transitions out of order.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

const TRANSITION_CHANNEL_SIZE: usize = 32;

/// Owner side of an observable value.
pub(crate) struct StateCell<T: Clone + Send + Sync + 'static> {
    current: watch::Sender<T>,
    transitions: broadcast::Sender<T>,
}

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    pub(crate) fn new(initial: T) -> Self {
        let (current, _) = watch::channel(initial);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_SIZE);
        Self {
            current,
            transitions,
        }
    }

    /// Current value (cheap clone of the watched value).
    pub(crate) fn get(&self) -> T {
        self.current.borrow().clone()
    }

    /// Publish `value` unconditionally.
    pub(crate) fn publish(&self, value: T) {
        self.update(|_| Some(value));
    }

    /// Atomically derive the next value from the current one.
    ///
    /// `f` returning `None` leaves the value untouched and notifies nobody.
    /// Returns whether a new value was published.
    pub(crate) fn update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        let transitions = &self.transitions;
        self.current.send_if_modified(|value| match f(value) {
            Some(next) => {
                // No receivers is fine; the watch side still holds the value.
                let _ = transitions.send(next.clone());
                *value = next;
                true
            }
            None => false,
        })
    }

    /// Subscribe to the value and every subsequent transition.
    pub(crate) fn subscribe(&self) -> StateStream<T> {
        // Hold the read lock so no publish lands between the snapshot
        // and the broadcast subscription.
        let guard = self.current.borrow();
        let transitions = self.transitions.subscribe();
        let current = guard.clone();
        drop(guard);

        StateStream {
            current,
            receiver: self.current.subscribe(),
            transitions,
        }
    }
}

/// A read-only subscription to a published state value.
///
/// Provides both point-in-time snapshot access and ordered change
/// notification via [`next()`](Self::next) or by converting to a `Stream`.
pub struct StateStream<T: Clone + Send + Sync + 'static> {
    current: T,
    receiver: watch::Receiver<T>,
    transitions: broadcast::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> StateStream<T> {
    /// The last value this subscription observed (the snapshot at
    /// subscription time until [`next()`](Self::next) is called).
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The latest published value, which may be ahead of `current()`.
    pub fn latest(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next transition.
    ///
    /// Transitions arrive in publication order. A subscriber that falls
    /// too far behind skips to the latest value. Returns `None` once the
    /// owner has been dropped and every queued transition was delivered.
    pub async fn next(&mut self) -> Option<T> {
        match self.transitions.recv().await {
            Ok(value) => {
                self.current = value.clone();
                Some(value)
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "state subscriber lagged; resynchronising");
                // Publishes hold the watch write lock while sending the
                // transition, so none can land between the read and the
                // new subscription.
                let guard = self.receiver.borrow_and_update();
                self.transitions = self.transitions.resubscribe();
                let value = guard.clone();
                drop(guard);
                self.current = value.clone();
                Some(value)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Convert into a `Stream` of transitions for `StreamExt` combinators.
    pub fn into_stream(self) -> StateTransitionStream<T> {
        StateTransitionStream {
            inner: BroadcastStream::new(self.transitions),
        }
    }
}

/// `Stream` adapter over the transition channel. Lag gaps are skipped.
pub struct StateTransitionStream<T: Clone + Send + Sync + 'static> {
    inner: BroadcastStream<T>,
}

impl<T: Clone + Send + Sync + 'static> Stream for StateTransitionStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(value)) => return Poll::Ready(Some(value)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(skipped, "state stream lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
