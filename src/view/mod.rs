//! The view controller: owns the connection machine, trail and stream subscription, and turns
//! transport traffic, probes and user intents into view data.

pub mod model;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use self::model::{StatusTone, ViewModel};
use crate::config::TrackerConfig;
use crate::driver::DriverId;
use crate::snapshot::DriverSnapshot;
use crate::snapshot::error::SnapshotError;
use crate::state_machine::StateMachine;
use crate::state_machine::connection::{
    ConnectionEvent, ConnectionMachine, ConnectionOutput, ConnectionState,
};
use crate::state_machine::trail::Trail;
use crate::track::{LatLng, StreamMessage, TrackPoint};
use crate::transport::{Delivery, MessageSink, StartOptions, StreamHandle, SubscriptionId, Transport};

/// User-initiated commands coming back from the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TogglePause,
    SetFollow(bool),
    ToggleFollow,
    Recenter,
}

pub struct ViewController {
    driver_id: DriverId,
    transport: Arc<dyn Transport>,
    deliveries: mpsc::UnboundedSender<Delivery>,

    connection: ConnectionMachine,
    trail: Trail,
    current: Option<TrackPoint>,
    snapshot: Option<Arc<DriverSnapshot>>,
    snapshot_error: Option<String>,
    stream: Option<StreamHandle>,

    paused: bool,
    follow: bool,
    camera: Option<LatLng>,
}

impl std::fmt::Debug for ViewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("driver_id", &self.driver_id)
            .field("transport", &"<Transport>")
            .field("connection", &self.connection)
            .field("trail_len", &self.trail.len())
            .field("paused", &self.paused)
            .field("follow", &self.follow)
            .finish()
    }
}

impl ViewController {
    /// Transport deliveries are sent to `deliveries`; the owner feeds them back through
    /// [`handle_delivery`](Self::handle_delivery).
    pub fn new(
        config: &TrackerConfig,
        transport: Arc<dyn Transport>,
        deliveries: mpsc::UnboundedSender<Delivery>,
    ) -> Self {
        Self {
            driver_id: config.driver_id.clone(),
            transport,
            deliveries,
            connection: ConnectionMachine::new(),
            trail: Trail::new(config.breadcrumb_size),
            current: None,
            snapshot: None,
            snapshot_error: None,
            stream: None,
            paused: false,
            follow: config.follow_mode_default,
            camera: None,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        self.connection.state()
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn current(&self) -> Option<&TrackPoint> {
        self.current.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn camera(&self) -> Option<LatLng> {
        self.camera
    }

    /// The subscription whose deliveries are currently accepted.
    pub fn active_subscription(&self) -> Option<&SubscriptionId> {
        self.stream.as_ref().map(StreamHandle::subscription)
    }

    /// Current point, else the snapshot's last known point.
    pub fn center(&self) -> Option<&TrackPoint> {
        self.current
            .as_ref()
            .or_else(|| self.snapshot.as_ref().map(|s| &s.last_known))
    }

    pub fn on_snapshot(&mut self, snapshot: Arc<DriverSnapshot>, now: u64) {
        info!(
            driver_id = %self.driver_id,
            name = %snapshot.name,
            "Driver snapshot loaded"
        );

        if self.camera.is_none() {
            self.camera = Some(snapshot.last_known.lat_lng());
        }
        self.snapshot = Some(snapshot);
        self.snapshot_error = None;

        if self.paused {
            return;
        }

        self.stop_stream();
        self.dispatch(ConnectionEvent::Connect);
        self.start_stream();
        self.dispatch(ConnectionEvent::Open { now });
    }

    pub fn on_snapshot_error(&mut self, err: &SnapshotError) {
        warn!(driver_id = %self.driver_id, error = %err, "Failed to load driver snapshot");
        self.snapshot_error = Some(err.to_string());
    }

    pub fn handle_delivery(&mut self, delivery: Delivery) {
        if self.active_subscription() != Some(&delivery.subscription) {
            debug!(
                subscription = %delivery.subscription,
                "Dropping delivery from inactive subscription"
            );
            return;
        }

        match delivery.payload {
            Ok(StreamMessage::Location(point)) => self.on_location(point),
            Ok(StreamMessage::Heartbeat { timestamp }) => {
                debug!(timestamp, "Heartbeat");
                self.dispatch(ConnectionEvent::Heartbeat { now: timestamp });
            }
            Err(e) => self.dispatch(ConnectionEvent::Error {
                message: e.to_string(),
            }),
        }
    }

    fn on_location(&mut self, point: TrackPoint) {
        if let Err(e) = point.validate() {
            warn!(driver_id = %self.driver_id, error = %e, "Rejected location");
            self.dispatch(ConnectionEvent::Error {
                message: e.to_string(),
            });
            return;
        }

        debug!(lat = point.lat, lng = point.lng, timestamp = point.timestamp, "Location");

        let now = point.timestamp;
        if self.follow {
            self.camera = Some(point.lat_lng());
        }
        self.trail.push(point.clone());
        self.current = Some(point);
        self.dispatch(ConnectionEvent::Tick { now });
    }

    /// Staleness probe, driven by an external interval.
    pub fn probe(&mut self, now: u64) {
        self.dispatch(ConnectionEvent::Timeout { now });
    }

    pub fn apply(&mut self, intent: Intent, now: u64) {
        match intent {
            Intent::TogglePause if self.paused => self.resume(now),
            Intent::TogglePause => self.pause(),
            Intent::SetFollow(follow) => self.set_follow(follow),
            Intent::ToggleFollow => self.set_follow(!self.follow),
            Intent::Recenter => self.recenter(),
        }
    }

    fn pause(&mut self) {
        info!(driver_id = %self.driver_id, "Pausing location stream");
        self.paused = true;
        self.stop_stream();
        self.dispatch(ConnectionEvent::Pause);
    }

    fn resume(&mut self, now: u64) {
        info!(driver_id = %self.driver_id, "Resuming location stream");
        self.paused = false;
        self.dispatch(ConnectionEvent::Resume);

        // Without a snapshot the stream starts once it arrives.
        if self.snapshot.is_some() {
            self.start_stream();
            self.dispatch(ConnectionEvent::Open { now });
        }
    }

    fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
        if follow {
            self.recenter();
        }
    }

    fn recenter(&mut self) {
        let target = self.center().map(TrackPoint::lat_lng);
        if target.is_some() {
            self.camera = target;
        }
    }

    /// Stop the stream and return to idle, e.g. when the view goes away.
    pub fn teardown(&mut self) {
        info!(driver_id = %self.driver_id, "Tearing down tracker view");
        self.stop_stream();
        self.dispatch(ConnectionEvent::Close);
    }

    fn start_stream(&mut self) {
        let sink = MessageSink::new(SubscriptionId::generate(), self.deliveries.clone());
        let options = StartOptions {
            start: self.center().cloned(),
        };

        info!(
            driver_id = %self.driver_id,
            subscription = %sink.subscription(),
            "Starting location stream"
        );
        self.stream = Some(self.transport.start(sink, options));
    }

    fn stop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.cancel();
        }
    }

    fn dispatch(&mut self, event: ConnectionEvent) {
        self.connection.process_input(event);

        while let Some(output) = self.connection.poll_output() {
            match output {
                ConnectionOutput::StatusChanged { from, to } => {
                    info!(driver_id = %self.driver_id, ?from, ?to, "Connection status changed");
                }
            }
        }
    }

    pub fn view(&self, now: u64) -> ViewModel {
        let snapshot = self.snapshot.as_deref();
        let state = self.connection.state();
        let current = self.current.as_ref();

        ViewModel {
            driver_id: snapshot.map_or_else(|| self.driver_id.to_string(), |s| s.driver_id.clone()),
            name: snapshot.map_or_else(|| model::PLACEHOLDER.to_string(), |s| s.name.clone()),
            equipment: snapshot
                .map_or_else(|| model::PLACEHOLDER.to_string(), |s| s.equipment.clone()),

            status: state.status,
            status_text: state.status.label(),
            status_tone: StatusTone::from(state.status),
            connection_error: state.error.clone(),

            current: self.current.clone(),
            center: self.center().cloned(),
            camera: self.camera,
            trail: self.trail.polyline(),
            accuracy_m: current.and_then(|p| p.accuracy_m).filter(|r| *r > 0.0),

            breadcrumb_count: self.trail.len(),
            speed_text: model::speed_text(current),
            heading_text: model::heading_text(current),
            last_update_text: model::fmt_ago(self.center().map(|p| p.timestamp), now),
            destination: snapshot
                .and_then(|s| s.destination.as_ref())
                .map_or_else(|| model::PLACEHOLDER.to_string(), |d| d.name.clone()),
            eta_text: model::eta_text(snapshot.and_then(DriverSnapshot::eta)),

            follow: self.follow,
            paused: self.paused,
            loading: snapshot.is_none() && self.snapshot_error.is_none(),
            snapshot_error: self.snapshot_error.clone(),
        }
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.stop_stream();
    }
}
