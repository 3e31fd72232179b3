use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::NaiveDate;
use dashmap::DashMap;
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::*;
use crate::model::Booking;

/// A lifecycle change pushed to observers (admin views).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Notification {
    BookingCreated(Booking),
    BookingDeleted { id: Ulid, date: NaiveDate },
    BookingsCleared {},
}

impl Notification {
    /// Wire event name.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::BookingCreated(_) => "booking-created",
            Notification::BookingDeleted { .. } => "booking-deleted",
            Notification::BookingsCleared {} => "bookings-cleared",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            Notification::BookingCreated(booking) => serde_json::to_value(booking).unwrap_or_default(),
            Notification::BookingDeleted { id, date } => serde_json::json!({ "id": id, "date": date }),
            Notification::BookingsCleared {} => serde_json::json!({}),
        }
    }
}

type Subscribers = DashMap<Ulid, mpsc::Sender<Notification>>;

/// Fan-out registry of subscribed observers.
///
/// Publishing never fails: a subscriber that is full misses the event, and one
/// whose receiver is gone is removed after the delivery pass.
pub struct ChangeNotifier {
    subscribers: Arc<Subscribers>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
        }
    }

    pub fn subscribe(&self) -> Result<Subscription, EngineError> {
        if self.subscribers.len() >= MAX_SUBSCRIBERS {
            return Err(EngineError::LimitExceeded("too many subscribers"));
        }
        let id = Ulid::new();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.subscribers.insert(id, tx);
        self.report_gauge();
        tracing::debug!("subscriber {id} attached");
        Ok(Subscription {
            id,
            rx,
            registry: self.subscribers.clone(),
        })
    }

    /// Returns whether the subscriber was registered.
    pub fn unsubscribe(&self, id: Ulid) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        self.report_gauge();
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver once to every current subscriber. Returns how many received it.
    pub fn publish(&self, notification: Notification) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        for entry in self.subscribers.iter() {
            match entry.value().try_send(notification.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    metrics::counter!(crate::observability::NOTIFICATIONS_DROPPED_TOTAL).increment(1);
                    tracing::debug!("subscriber {} lagging, dropped {}", entry.key(), notification.name());
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }
        // Shard guards are released; safe to mutate the map now.
        for id in closed {
            self.subscribers.remove(&id);
            tracing::debug!("subscriber {id} disconnected");
        }
        self.report_gauge();
        metrics::counter!(crate::observability::NOTIFICATIONS_DELIVERED_TOTAL).increment(delivered as u64);
        delivered
    }

    fn report_gauge(&self) {
        metrics::gauge!(crate::observability::SUBSCRIBERS_ACTIVE).set(self.subscribers.len() as f64);
    }
}

/// An observer's handle. Dropping it unsubscribes.
pub struct Subscription {
    id: Ulid,
    rx: mpsc::Receiver<Notification>,
    registry: Arc<Subscribers>,
}

impl Subscription {
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Next notification, or `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Notification>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
