//! Fire-and-forget broadcast of call lifecycle events.
//!
//! Each call id is its own topic. Subscribers must join before an event is
//! published to be guaranteed to see it; there is no replay or backlog, and
//! a lagging receiver silently loses events. This is a live-dashboard feed,
//! not a durable log.
//!
//! Topics live exactly as long as their subscribers: dropping the last
//! [`Subscription`] for a call id removes the topic from the map, so an
//! arbitrary stream of subscribe/disconnect cycles cannot grow it.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;

use crate::types::CallEvent;

/// Per-topic channel capacity. A triage sequence emits two events; the
/// headroom only matters for very slow SSE consumers.
const TOPIC_CAPACITY: usize = 64;

type Topics = Arc<Mutex<HashMap<String, broadcast::Sender<CallEvent>>>>;

/// Per-call event broadcaster. Cheap to clone; clones share topics.
#[derive(Clone, Default)]
pub struct Broadcaster {
    topics: Topics,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the topic for `call_id`, creating it if needed. Events published
    /// after this call are visible on the returned subscription; dropping it
    /// releases the topic once no other subscriber remains.
    pub fn subscribe(&self, call_id: &str) -> Subscription {
        let mut topics = self.topics.lock().expect("broadcaster lock poisoned");
        let rx = topics
            .entry(call_id.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();
        Subscription {
            rx,
            guard: TopicGuard {
                topics: Arc::clone(&self.topics),
                call_id: call_id.to_string(),
            },
        }
    }

    /// Deliver `event` to every current subscriber of `call_id`.
    ///
    /// Best effort: with no topic or no live receivers the event is dropped
    /// and the dead topic pruned. Returns the number of receivers reached.
    pub fn publish(&self, call_id: &str, event: CallEvent) -> usize {
        let mut topics = self.topics.lock().expect("broadcaster lock poisoned");
        match topics.get(call_id) {
            Some(tx) => match tx.send(event) {
                Ok(n) => n,
                Err(_) => {
                    topics.remove(call_id);
                    0
                }
            },
            None => 0,
        }
    }

    /// Number of live topics.
    pub fn topic_count(&self) -> usize {
        self.topics.lock().expect("broadcaster lock poisoned").len()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// One subscriber's handle on a call topic.
///
/// Field order matters: the receiver drops before the guard, so the guard
/// observes an accurate receiver count when deciding whether to remove the
/// topic.
pub struct Subscription {
    rx: broadcast::Receiver<CallEvent>,
    guard: TopicGuard,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<CallEvent, broadcast::error::RecvError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<CallEvent, broadcast::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Convert into a `Stream` of events, keeping the topic alive until the
    /// stream is dropped.
    pub fn into_stream(self) -> SubscriptionStream {
        SubscriptionStream {
            inner: BroadcastStream::new(self.rx),
            _guard: self.guard,
        }
    }
}

/// `Stream` form of a [`Subscription`], for SSE handlers. Same field-order
/// invariant as `Subscription`.
pub struct SubscriptionStream {
    inner: BroadcastStream<CallEvent>,
    _guard: TopicGuard,
}

impl Stream for SubscriptionStream {
    type Item = Result<CallEvent, BroadcastStreamRecvError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Removes the topic entry once the last receiver is gone. Always dropped
/// after the receiver it was issued with.
struct TopicGuard {
    topics: Topics,
    call_id: String,
}

impl Drop for TopicGuard {
    fn drop(&mut self) {
        let Ok(mut topics) = self.topics.lock() else {
            return;
        };
        if let Some(tx) = topics.get(&self.call_id) {
            if tx.receiver_count() == 0 {
                topics.remove(&self.call_id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
