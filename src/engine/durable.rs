use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::info;
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

use super::store::{InMemoryStore, Store, StoreError};

/// In-memory bookings made durable by the WAL.
///
/// Every mutation holds the WAL lock across log-append and apply, so each store
/// operation is atomic and the log order is the apply order. Reads go straight
/// to memory and never wait on the log.
pub struct WalStore {
    mem: InMemoryStore,
    wal: Mutex<Wal>,
}

impl WalStore {
    /// Replay the log at `path` (if any) and open it for appending.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let events = Wal::replay(path)?;
        let mem = InMemoryStore::new();
        for event in &events {
            mem.apply_event(event);
        }
        let wal = Wal::open(path)?;
        info!(
            "opened booking log {} ({} records, {} live bookings)",
            path.display(),
            events.len(),
            mem.len()
        );
        Ok(Self {
            mem,
            wal: Mutex::new(wal),
        })
    }

    pub async fn appends_since_compact(&self) -> u64 {
        self.wal.lock().await.appends_since_compact()
    }

    /// Rewrite the log as one `Inserted` record per live booking.
    pub async fn compact(&self) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        let events: Vec<StoreEvent> = self.mem.snapshot().into_iter().map(StoreEvent::Inserted).collect();
        wal.compact(&events)?;
        info!("compacted booking log to {} records", events.len());
        Ok(())
    }

    /// Log-then-apply under the held WAL lock.
    fn commit(&self, wal: &mut Wal, event: &StoreEvent) -> Result<u64, StoreError> {
        let started = Instant::now();
        wal.append(event)?;
        metrics::histogram!(crate::observability::WAL_APPEND_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        Ok(self.mem.apply_event(event))
    }
}

#[async_trait]
impl Store for WalStore {
    async fn insert(&self, booking: Booking) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        self.commit(&mut wal, &StoreEvent::Inserted(booking))?;
        Ok(())
    }

    async fn get(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        self.mem.get(id).await
    }

    async fn delete(&self, id: Ulid) -> Result<bool, StoreError> {
        let mut wal = self.wal.lock().await;
        if self.mem.get_booking(&id).is_none() {
            return Ok(false);
        }
        Ok(self.commit(&mut wal, &StoreEvent::Deleted { id })? > 0)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut wal = self.wal.lock().await;
        self.commit(&mut wal, &StoreEvent::Cleared)
    }

    async fn delete_before(&self, date: NaiveDate) -> Result<u64, StoreError> {
        let mut wal = self.wal.lock().await;
        self.commit(&mut wal, &StoreEvent::PurgedBefore { date })
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        self.mem.list_by_date(date).await
    }

    async fn list_by_phone(&self, phone: &str) -> Result<Vec<Booking>, StoreError> {
        self.mem.list_by_phone(phone).await
    }

    async fn list_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        self.mem.list_by_range(from, to).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Booking>, StoreError> {
        self.mem.list_recent(limit).await
    }

    async fn aggregate_by_date(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRevenue>, StoreError> {
        self.mem.aggregate_by_date(from, to).await
    }
}
