use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use slotbook::auth::Access;
use slotbook::config::Config;
use slotbook::engine::{Engine, WalStore};
use slotbook::notify::ChangeNotifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    slotbook::observability::init(config.metrics_port)?;

    std::fs::create_dir_all(&config.data_dir)?;
    let store = Arc::new(WalStore::open(&config.wal_path())?);
    let engine = Arc::new(Engine::new(
        store.clone(),
        Arc::new(ChangeNotifier::new()),
        config.prices.clone(),
    ));

    info!("slotbook started");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  compact_threshold: {}", config.compact_threshold);
    for (duration, price) in config.prices.iter() {
        info!("  price: {duration}m = {price}");
    }
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    if config.purge_on_startup {
        let today = Local::now().date_naive();
        let purged = engine.admin_delete_past(Access::Privileged, today).await?;
        info!("startup purge removed {purged} bookings dated before {today}");
    }

    tokio::spawn(slotbook::reaper::run_compactor(store.clone(), config.compact_threshold));

    // Audit tap: every lifecycle change goes to the log.
    let mut audit = engine.notify.subscribe()?;
    let audit_task = tokio::spawn(async move {
        while let Some(event) = audit.recv().await {
            info!(event = event.name(), "{}", event.payload());
        }
    });

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    warn!("failed to register SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    shutdown.await;
    info!("shutdown signal received");

    audit_task.abort();
    if let Err(e) = store.compact().await {
        warn!("final compaction failed: {e}");
    }

    info!("slotbook stopped");
    Ok(())
}
