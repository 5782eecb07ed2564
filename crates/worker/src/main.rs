mod scheduler;

use chrono::Utc;
use shared::config::WorkerConfig;
use shared::notifier::Notifier;
use shared::repos::Store;
use tokio::signal;
use tokio::time::{self, Duration};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "worker=info".to_string()))
        .init();

    let config = match WorkerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read worker config: {err}");
            std::process::exit(1);
        }
    };

    let store = match Store::connect(&config.database_url, config.database_max_connections).await
    {
        Ok(store) => store,
        Err(err) => {
            error!("failed to connect to postgres: {err}");
            std::process::exit(1);
        }
    };

    let notifier = build_notifier(&config);

    info!(
        "worker starting (check-due every {}s, notifications {})",
        config.tick_seconds,
        if notifier.is_some() { "enabled" } else { "disabled" }
    );

    let mut ticker = time::interval(Duration::from_secs(config.tick_seconds));

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("shutdown signal received, draining pool");
                store.close().await;
                break;
            }
            _ = ticker.tick() => {
                scheduler::run_check_due(&store, notifier.as_ref(), &config.notification_sound, Utc::now()).await;
            }
        }
    }
}

/// No bridge URL, or notifications disabled, means the scheduler still
/// marks reminders dispatched on schedule but never calls out (spec
/// §4.9: the bridge itself is an external collaborator).
fn build_notifier(config: &WorkerConfig) -> Option<Notifier> {
    if !config.notifications_enabled {
        return None;
    }

    let bridge_url = config.notification_bridge_url.clone()?;
    match Notifier::new(bridge_url) {
        Ok(notifier) => Some(notifier),
        Err(err) => {
            error!("failed to build notification client: {err}");
            None
        }
    }
}
