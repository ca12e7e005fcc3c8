use anyhow::Result;
use driver_tracker::TrackPoint;
use driver_tracker::transport::simulator::{DEFAULT_START_LAT, DEFAULT_START_LNG, Simulator};
use futures::StreamExt;
use tracing::{debug, info};

// Prints the simulated feed as JSON lines, one frame per line, in the same shape a real feed
// would send.

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let lat = env_f64("START_LAT")?.unwrap_or(DEFAULT_START_LAT);
    let lng = env_f64("START_LNG")?.unwrap_or(DEFAULT_START_LNG);
    let limit = std::env::var("MESSAGE_LIMIT")
        .ok()
        .map(|v| v.parse::<usize>())
        .transpose()?;

    let start = TrackPoint::basic(lat, lng, 0);
    let simulator = match std::env::var("SEED").ok() {
        Some(seed) => Simulator::seeded(Some(&start), seed.parse()?),
        None => Simulator::new(Some(&start)),
    };

    info!(lat, lng, limit = ?limit, "Simulating location feed");

    let messages = simulator.into_stream().take(limit.unwrap_or(usize::MAX));
    let mut messages = std::pin::pin!(messages);

    while let Some(message) = messages.next().await {
        let frame = message.encode()?;
        println!("{}", String::from_utf8_lossy(&frame));
        debug!(timestamp = message.timestamp(), "Emitted frame");
    }

    Ok(())
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    Ok(std::env::var(key).ok().map(|v| v.parse()).transpose()?)
}
