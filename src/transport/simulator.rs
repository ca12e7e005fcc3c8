//! A fake vehicle that wanders around a start point, standing in for a real location feed.

use std::f64::consts::PI;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info};

use super::{MessageSink, StartOptions, StreamHandle, Transport, spawn_pump};
use crate::state_machine::wrappers::input::system::{EpochMillis, SystemResource};
use crate::track::{StreamMessage, TrackPoint};

pub const DEFAULT_START_LAT: f64 = 37.781;
pub const DEFAULT_START_LNG: f64 = -122.404;
pub const DEFAULT_HEADING_DEG: f64 = 110.0;

/// Distance moved per tick, in degrees (roughly 80 m).
const STEP_DEG: f64 = 0.0008;
/// Maximum heading change per tick, in either direction.
const HEADING_JITTER_DEG: f64 = 15.0;
const HEARTBEAT_PROBABILITY: f64 = 0.25;

pub const FIRST_TICK_DELAY: Duration = Duration::from_secs(1);
pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// What a single simulator step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub point: TrackPoint,
    pub heartbeat: bool,
}

impl Step {
    pub fn into_messages(self) -> impl Iterator<Item = StreamMessage> {
        let timestamp = self.point.timestamp;
        let heartbeat = self
            .heartbeat
            .then_some(StreamMessage::Heartbeat { timestamp });
        std::iter::once(StreamMessage::Location(self.point)).chain(heartbeat)
    }
}

#[derive(Debug)]
pub struct Simulator {
    lat: f64,
    lng: f64,
    heading: f64,
    rng: StdRng,
}

impl Simulator {
    /// Start from `start`, or the default point when absent.
    pub fn new(start: Option<&TrackPoint>) -> Self {
        Self::with_rng(start, StdRng::from_os_rng())
    }

    /// Deterministic simulator for replaying a route.
    pub fn seeded(start: Option<&TrackPoint>, seed: u64) -> Self {
        Self::with_rng(start, StdRng::seed_from_u64(seed))
    }

    fn with_rng(start: Option<&TrackPoint>, rng: StdRng) -> Self {
        Self {
            lat: start.map_or(DEFAULT_START_LAT, |p| p.lat),
            lng: start.map_or(DEFAULT_START_LNG, |p| p.lng),
            heading: start
                .and_then(|p| p.heading)
                .unwrap_or(DEFAULT_HEADING_DEG),
            rng,
        }
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Advance one tick, stamping the produced point with `now`.
    pub fn step(&mut self, now: u64) -> Step {
        let rad = self.heading * PI / 180.0;
        self.lat += rad.sin() * STEP_DEG;
        self.lng += rad.cos() * STEP_DEG;

        let jitter = self
            .rng
            .random_range(-HEADING_JITTER_DEG..HEADING_JITTER_DEG);
        self.heading = (self.heading + jitter).rem_euclid(360.0);

        let point = TrackPoint {
            lat: self.lat,
            lng: self.lng,
            speed_kph: Some(self.rng.random_range(58.0..68.0)),
            heading: Some(self.heading),
            accuracy_m: Some(self.rng.random_range(10.0..18.0)),
            timestamp: now,
        };

        Step {
            point,
            heartbeat: self.rng.random_bool(HEARTBEAT_PROBABILITY),
        }
    }

    /// Turn the simulator into an endless timed stream: the first tick after
    /// [`FIRST_TICK_DELAY`], then one every [`TICK_INTERVAL`].
    pub fn into_stream(mut self) -> impl Stream<Item = StreamMessage> + Send {
        stream! {
            let mut ticker = interval_at(Instant::now() + FIRST_TICK_DELAY, TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = IntervalStream::new(ticker);

            while ticks.next().await.is_some() {
                let EpochMillis(now) = EpochMillis::generate();
                for message in self.step(now).into_messages() {
                    yield message;
                }
            }
        }
    }
}

/// [`Transport`] backed by a [`Simulator`].
#[derive(Debug, Default)]
pub struct SimulatedTransport {
    seed: Option<u64>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start replays the same pseudo-random route.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Transport for SimulatedTransport {
    fn start(&self, sink: MessageSink, options: StartOptions) -> StreamHandle {
        let start = options.start.as_ref();
        let simulator = match self.seed {
            Some(seed) => Simulator::seeded(start, seed),
            None => Simulator::new(start),
        };

        info!(
            subscription = %sink.subscription(),
            lat = simulator.lat,
            lng = simulator.lng,
            "Starting simulated location stream"
        );

        let messages = simulator.into_stream().map(|message| {
            debug!(timestamp = message.timestamp(), "Simulated message");
            Ok(message)
        });

        spawn_pump(messages, sink)
    }
}
