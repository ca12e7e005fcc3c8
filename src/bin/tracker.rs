use std::sync::Arc;

use anyhow::Result;
use driver_tracker::transport::simulator::SimulatedTransport;
use driver_tracker::{HttpSnapshotSource, SnapshotCache, TrackerConfig, spawn_tracker};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = TrackerConfig::from_env()?;
    let cache = Arc::new(SnapshotCache::new(config.snapshot_freshness));

    let handle = spawn_tracker(
        config,
        Arc::new(SimulatedTransport::new()),
        Arc::new(HttpSnapshotSource::new()),
        Arc::clone(&cache),
    )?;

    let mut view = handle.view();

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    warn!("Tracker stopped unexpectedly");
                    break;
                }

                let model = view.borrow_and_update().clone();
                if let Some(err) = &model.snapshot_error {
                    warn!(error = %err, "Snapshot unavailable");
                }
                info!(
                    status = model.status_text,
                    driver = %model.name,
                    speed = %model.speed_text,
                    heading = %model.heading_text,
                    last_update = %model.last_update_text,
                    eta = %model.eta_text,
                    breadcrumbs = model.breadcrumb_count,
                    "View updated"
                );
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    let last = handle.close().await?;
    info!(status = last.status_text, "Tracker closed");
    cache.clear();

    Ok(())
}
