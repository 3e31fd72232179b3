use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use ulid::Ulid;

use slotbook::auth::Access;
use slotbook::engine::{Engine, WalStore};
use slotbook::model::BookingRequest;
use slotbook::notify::{ChangeNotifier, Notification, Subscription};
use slotbook::pricing::PriceTable;

// ── Test infrastructure ──────────────────────────────────────

fn start_engine() -> (Arc<Engine>, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!("slotbook_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bookings.wal");
    (open_engine(&path), path)
}

fn open_engine(path: &std::path::Path) -> Arc<Engine> {
    let store = Arc::new(WalStore::open(path).unwrap());
    Arc::new(Engine::new(store, Arc::new(ChangeNotifier::new()), PriceTable::default()))
}

fn request(phone: &str, time: &str, duration: i64) -> BookingRequest {
    BookingRequest {
        name: "Dana".into(),
        phone: phone.into(),
        date: "2031-03-14".into(),
        time: time.into(),
        duration,
        price: None,
    }
}

/// Wait for a notification with timeout.
async fn recv_notification(sub: &mut Subscription, timeout: Duration) -> Option<Notification> {
    tokio::time::timeout(timeout, sub.next()).await.ok().flatten()
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn every_subscriber_sees_create() {
    let (engine, _) = start_engine();
    let mut admin_view = engine.notify.subscribe().unwrap();
    let mut audit = engine.notify.subscribe().unwrap();

    let booking = engine
        .create_booking(Access::Public, request("555-1", "18:00", 90))
        .await
        .unwrap();

    for sub in [&mut admin_view, &mut audit] {
        let n = recv_notification(sub, Duration::from_secs(2)).await.unwrap();
        assert_eq!(n.name(), "booking-created");
        assert_eq!(n.payload()["id"], booking.id.to_string());
        assert_eq!(n.payload()["time"], "18:00");
        assert_eq!(n.payload()["price"], 15.0);
    }
}

#[tokio::test]
async fn rejected_create_publishes_nothing() {
    let (engine, _) = start_engine();
    engine
        .create_booking(Access::Public, request("555-1", "18:00", 90))
        .await
        .unwrap();

    let mut sub = engine.notify.subscribe().unwrap();
    assert!(engine
        .create_booking(Access::Public, request("555-2", "18:30", 30))
        .await
        .is_err());
    assert!(recv_notification(&mut sub, Duration::from_millis(100)).await.is_none());
}

#[tokio::test]
async fn dropped_subscription_is_unregistered() {
    let (engine, _) = start_engine();
    let sub = engine.notify.subscribe().unwrap();
    assert_eq!(engine.notify.subscriber_count(), 1);
    drop(sub);
    assert_eq!(engine.notify.subscriber_count(), 0);

    // Publishing with nobody listening still succeeds.
    engine
        .create_booking(Access::Public, request("555-1", "09:00", 60))
        .await
        .unwrap();
}

#[tokio::test]
async fn unsubscribe_ends_stream() {
    let (engine, _) = start_engine();
    let mut sub = engine.notify.subscribe().unwrap();
    engine
        .create_booking(Access::Public, request("555-1", "09:00", 60))
        .await
        .unwrap();

    assert!(engine.notify.unsubscribe(sub.id()));
    // Already queued events drain, then the stream ends.
    assert!(sub.next().await.is_some());
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn wire_shape_of_events() {
    let (engine, _) = start_engine();
    let mut sub = engine.notify.subscribe().unwrap();
    let b = engine
        .create_booking(Access::Public, request("555-1", "09:00", 60))
        .await
        .unwrap();
    engine.admin_delete(Access::Privileged, b.id).await.unwrap();
    engine.admin_delete_all(Access::Privileged).await.unwrap();

    let created = recv_notification(&mut sub, Duration::from_secs(1)).await.unwrap();
    let json = serde_json::to_value(&created).unwrap();
    assert_eq!(json["event"], "booking-created");
    assert_eq!(json["data"]["date"], "2031-03-14");

    let deleted = recv_notification(&mut sub, Duration::from_secs(1)).await.unwrap();
    assert_eq!(
        serde_json::to_value(&deleted).unwrap(),
        serde_json::json!({ "event": "booking-deleted", "data": { "id": b.id, "date": "2031-03-14" } })
    );

    let cleared = recv_notification(&mut sub, Duration::from_secs(1)).await.unwrap();
    assert_eq!(serde_json::to_value(&cleared).unwrap()["event"], "bookings-cleared");
}

#[tokio::test]
async fn bookings_survive_reopen() {
    let (engine, path) = start_engine();
    let kept = engine
        .create_booking(Access::Public, request("555-1", "10:00", 60))
        .await
        .unwrap();
    let cancelled = engine
        .create_booking(Access::Public, request("555-2", "12:00", 120))
        .await
        .unwrap();
    let early = chrono::NaiveDate::from_ymd_opt(2031, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    engine.cancel_booking(cancelled.id, "555-2", early).await.unwrap();
    drop(engine);

    let engine = open_engine(&path);
    let mine = engine.list_by_phone("555-1").await.unwrap();
    assert_eq!(mine, vec![kept]);
    assert!(engine.list_by_phone("555-2").await.unwrap().is_empty());

    let slots = engine
        .availability("2031-03-14".parse().unwrap())
        .await
        .unwrap();
    let taken: Vec<String> = slots
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.time.to_string())
        .collect();
    assert_eq!(taken, ["10:00", "10:30"]);
}
