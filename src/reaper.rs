use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::WalStore;

const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that compacts the booking log once `threshold` appends have
/// accumulated since the last compaction. A threshold of 0 disables it.
pub async fn run_compactor(store: Arc<WalStore>, threshold: u64) {
    if threshold == 0 {
        info!("log compaction disabled");
        return;
    }
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        compact_if_due(&store, threshold).await;
    }
}

/// Returns whether a compaction ran.
pub async fn compact_if_due(store: &WalStore, threshold: u64) -> bool {
    let appends = store.appends_since_compact().await;
    if appends < threshold {
        return false;
    }
    match store.compact().await {
        Ok(()) => {
            info!("compacted booking log after {appends} appends");
            true
        }
        Err(e) => {
            warn!("booking log compaction failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Store;
    use crate::model::Booking;
    use chrono::NaiveDateTime;
    use std::path::PathBuf;
    use ulid::Ulid;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("slotbook_test_reaper");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let store = WalStore::open(&test_wal_path("threshold.wal")).unwrap();
        for hour in 8..11 {
            store
                .insert(Booking {
                    id: Ulid::new(),
                    name: "A".into(),
                    phone: "555".into(),
                    date: "2024-06-01".parse().unwrap(),
                    time: crate::model::ClockTime::hm(hour, 0),
                    duration: 60,
                    price: 10.0,
                    created_at: NaiveDateTime::default(),
                })
                .await
                .unwrap();
        }

        assert!(!compact_if_due(&store, 4).await);
        assert_eq!(store.appends_since_compact().await, 3);

        assert!(compact_if_due(&store, 3).await);
        assert_eq!(store.appends_since_compact().await, 0);
        assert_eq!(store.list_recent(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn zero_threshold_returns_immediately() {
        let store = Arc::new(WalStore::open(&test_wal_path("disabled.wal")).unwrap());
        tokio::time::timeout(Duration::from_secs(1), run_compactor(store, 0))
            .await
            .unwrap();
    }
}
