/**
 * Sync Agent Entry Point
 *
 * Headless runner for the sync core. Loads configuration, opens a session,
 * refreshes both datasets once and prints a summary. With `--watch` it keeps
 * refreshing at the configured interval until Ctrl-C.
 *
 * Usage: sync_agent [--watch] [CONFIG.toml]
 */

use disconnect_sync::client::{Config, SyncSession};
use disconnect_sync::shared::{AppConfig, DatasetKind};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "disconnect_sync=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let mut watch = false;
    let mut config_path: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--watch" | "-w" => watch = true,
            "--help" | "-h" => {
                println!("Usage: sync_agent [--watch] [CONFIG.toml]");
                return Ok(());
            }
            path => config_path = Some(PathBuf::from(path)),
        }
    }

    let mut app = AppConfig::load(config_path.as_deref())?;
    if watch && app.refresh_interval.is_none() {
        app.refresh_interval = Some(DEFAULT_WATCH_INTERVAL);
    }

    let session = SyncSession::start(Config::from_app(app)).await?;
    session.load_cached().await;

    for (kind, result) in session.refresh_all().await {
        match result {
            Ok(outcome) => tracing::info!(dataset = %kind, ?outcome, "initial refresh"),
            Err(e) => tracing::error!(dataset = %kind, error = %e, "initial refresh failed"),
        }
    }
    print_summary(&session);

    if watch {
        session.spawn_periodic();
        tracing::info!("watching for changes, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        print_summary(&session);
    }

    session.shutdown();
    Ok(())
}

fn print_summary(session: &SyncSession) {
    for kind in DatasetKind::ALL {
        let state = session.dataset(kind);
        let dataset = state.snapshot();
        let pending = dataset.pending().count();
        match state.load_error() {
            Some(error) => println!("{:<14} unavailable: {}", kind.name(), error),
            None => println!(
                "{:<14} {:>6} records, {} pending, status {}",
                kind.name(),
                dataset.len(),
                pending,
                state.status()
            ),
        }
    }

    let metrics = session.metrics();
    println!(
        "passes: {} (snapshot {}, patch {}, unchanged {}, failed {})",
        metrics.total_passes,
        metrics.snapshot_passes,
        metrics.patch_passes,
        metrics.unchanged_passes,
        metrics.failed_passes
    );
}
