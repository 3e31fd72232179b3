mod availability;
mod conflict;
mod durable;
mod error;
mod mutations;
mod queries;
mod slots;
mod store;

pub use availability::{availability, merge_overlapping};
pub use durable::WalStore;
pub use error::EngineError;
pub use slots::{daily_slots, DAY_OPENS, LAST_EVENING_SLOT, SLOT_MINUTES};
pub use store::{InMemoryStore, Store, StoreError};

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::notify::{ChangeNotifier, Notification};
use crate::pricing::PriceTable;

/// The booking lifecycle manager for the single schedulable resource.
///
/// Creates serialize per date: the conflict check and the insert run under the
/// date's lock, so two overlapping requests for one day cannot both land. Reads
/// and deletes go straight to the store.
pub struct Engine {
    store: Arc<dyn Store>,
    pub notify: Arc<ChangeNotifier>,
    prices: PriceTable,
    date_locks: DashMap<NaiveDate, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, notify: Arc<ChangeNotifier>, prices: PriceTable) -> Self {
        Self {
            store,
            notify,
            prices,
            date_locks: DashMap::new(),
        }
    }

    /// Engine over a fresh in-memory store with the default price table.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ChangeNotifier::new()),
            PriceTable::default(),
        )
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Acquire the write lock for one date.
    pub(super) async fn lock_date(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = self.date_locks.entry(date).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Drop idle lock entries for dates before `date`.
    pub(super) fn prune_date_locks(&self, date: NaiveDate) {
        self.date_locks
            .retain(|d, lock| *d >= date || Arc::strong_count(lock) > 1);
    }

    pub(super) fn publish(&self, notification: Notification) {
        let name = notification.name();
        let delivered = self.notify.publish(notification);
        tracing::debug!("published {name} to {delivered} subscribers");
    }
}
