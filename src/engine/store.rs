use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

/// Opaque infrastructure failure. The engine reports it and never retries.
#[derive(Debug, thiserror::Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError(e.to_string())
    }
}

/// Persistence boundary. Each operation is atomic on its own; check-then-insert
/// atomicity is the engine's job.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert(&self, booking: Booking) -> Result<(), StoreError>;
    async fn get(&self, id: Ulid) -> Result<Option<Booking>, StoreError>;
    /// Returns whether the booking existed.
    async fn delete(&self, id: Ulid) -> Result<bool, StoreError>;
    async fn delete_all(&self) -> Result<u64, StoreError>;
    /// Delete every booking dated strictly before `date`.
    async fn delete_before(&self, date: NaiveDate) -> Result<u64, StoreError>;
    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Booking>, StoreError>;
    /// Ordered by `(date, time)` ascending.
    async fn list_by_phone(&self, phone: &str) -> Result<Vec<Booking>, StoreError>;
    /// Inclusive on both ends, ordered by `(date, time)` ascending.
    async fn list_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, StoreError>;
    /// The `limit` latest bookings, ordered by `(date, time)` descending.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Booking>, StoreError>;
    /// Per-date revenue and count inside `[from, to]`, ascending by date.
    async fn aggregate_by_date(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRevenue>, StoreError>;
}

pub struct InMemoryStore {
    bookings: DashMap<Ulid, Booking>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn get_booking(&self, id: &Ulid) -> Option<Booking> {
        self.bookings.get(id).map(|e| e.value().clone())
    }

    pub fn snapshot(&self) -> Vec<Booking> {
        let mut all: Vec<Booking> = self.bookings.iter().map(|e| e.value().clone()).collect();
        sort_by_slot(&mut all);
        all
    }

    fn collect(&self, mut keep: impl FnMut(&Booking) -> bool) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|e| keep(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }

    // ── Event application ────────────────────────────────────

    /// Apply a store mutation and return the number of rows it touched.
    pub fn apply_event(&self, event: &StoreEvent) -> u64 {
        match event {
            StoreEvent::Inserted(booking) => {
                self.bookings.insert(booking.id, booking.clone());
                1
            }
            StoreEvent::Deleted { id } => u64::from(self.bookings.remove(id).is_some()),
            StoreEvent::Cleared => self.remove_where(|_| true),
            StoreEvent::PurgedBefore { date } => self.remove_where(|b| b.date < *date),
        }
    }

    fn remove_where(&self, mut doomed: impl FnMut(&Booking) -> bool) -> u64 {
        let mut removed = 0;
        self.bookings.retain(|_, b| {
            if doomed(b) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

pub(crate) fn sort_by_slot(bookings: &mut [Booking]) {
    bookings.sort_by_key(|b| (b.date, b.time, b.id));
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert(&self, booking: Booking) -> Result<(), StoreError> {
        self.apply_event(&StoreEvent::Inserted(booking));
        Ok(())
    }

    async fn get(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        Ok(self.get_booking(&id))
    }

    async fn delete(&self, id: Ulid) -> Result<bool, StoreError> {
        Ok(self.apply_event(&StoreEvent::Deleted { id }) > 0)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        Ok(self.apply_event(&StoreEvent::Cleared))
    }

    async fn delete_before(&self, date: NaiveDate) -> Result<u64, StoreError> {
        Ok(self.apply_event(&StoreEvent::PurgedBefore { date }))
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        let mut rows = self.collect(|b| b.date == date);
        sort_by_slot(&mut rows);
        Ok(rows)
    }

    async fn list_by_phone(&self, phone: &str) -> Result<Vec<Booking>, StoreError> {
        let mut rows = self.collect(|b| b.phone == phone);
        sort_by_slot(&mut rows);
        Ok(rows)
    }

    async fn list_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        let mut rows = self.collect(|b| from <= b.date && b.date <= to);
        sort_by_slot(&mut rows);
        Ok(rows)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Booking>, StoreError> {
        let mut rows = self.collect(|_| true);
        rows.sort_by_key(|b| Reverse((b.date, b.time, b.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn aggregate_by_date(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRevenue>, StoreError> {
        let mut by_date: BTreeMap<NaiveDate, (f64, u64)> = BTreeMap::new();
        for entry in self.bookings.iter() {
            let b = entry.value();
            if from <= b.date && b.date <= to {
                let row = by_date.entry(b.date).or_default();
                row.0 += b.price;
                row.1 += 1;
            }
        }
        Ok(by_date
            .into_iter()
            .map(|(date, (revenue, bookings))| DailyRevenue { date, revenue, bookings })
            .collect())
    }
}
