//! The async runtime around a [`ViewController`].
//!
//! One task owns the controller and multiplexes four event sources:
//! - the snapshot fetch (once),
//! - transport deliveries,
//! - the staleness probe interval,
//! - user intents.
//!
//! After every event it publishes a fresh [`ViewModel`] on a `watch` channel, which is all the
//! rendering surface ever reads.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::config::{ConfigError, TrackerConfig};
use crate::snapshot::SnapshotSource;
use crate::snapshot::cache::SnapshotCache;
use crate::state_machine::wrappers::input::system::{EpochMillis, SystemResource};
use crate::transport::Transport;
use crate::view::model::ViewModel;
use crate::view::{Intent, ViewController};

/// Indicates that the tracker task has already shut down.
#[derive(Debug, thiserror::Error)]
#[error("tracker is no longer running")]
pub struct TrackerClosed;

/// Handle to a running tracker. Dropping it shuts the tracker down.
#[derive(Debug)]
pub struct TrackerHandle {
    intents: mpsc::UnboundedSender<Intent>,
    view: watch::Receiver<ViewModel>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn send(&self, intent: Intent) -> Result<(), TrackerClosed> {
        self.intents.send(intent).map_err(|_| TrackerClosed)
    }

    /// A receiver for the latest view model.
    pub fn view(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }

    /// Tear the view down and wait for the tracker task to finish.
    pub async fn close(self) -> Result<ViewModel, tokio::task::JoinError> {
        let Self { intents, view, task } = self;
        drop(intents);
        task.await?;
        let last = view.borrow().clone();
        Ok(last)
    }
}

fn now_millis<C>() -> u64
where
    C: SystemResource + Into<EpochMillis>,
{
    let now: EpochMillis = C::generate().into();
    now.as_u64()
}

/// Validate `config` and spawn the tracker task on the wall clock. Must be called within a Tokio
/// runtime.
pub fn spawn_tracker<S>(
    config: TrackerConfig,
    transport: Arc<dyn Transport>,
    source: Arc<S>,
    cache: Arc<SnapshotCache>,
) -> Result<TrackerHandle, ConfigError>
where
    S: SnapshotSource + Send + Sync + 'static,
{
    spawn_tracker_with_clock::<EpochMillis, S>(config, transport, source, cache)
}

/// Like [`spawn_tracker`], reading `now` for opens, probes and intents from `C`.
///
/// `C` must be on the same timeline as the timestamps the transport delivers, since ticks and
/// probes are compared against each other.
pub fn spawn_tracker_with_clock<C, S>(
    config: TrackerConfig,
    transport: Arc<dyn Transport>,
    source: Arc<S>,
    cache: Arc<SnapshotCache>,
) -> Result<TrackerHandle, ConfigError>
where
    C: SystemResource + Into<EpochMillis> + Send + 'static,
    S: SnapshotSource + Send + Sync + 'static,
{
    config.validate()?;

    let (deliveries_tx, deliveries_rx) = mpsc::unbounded_channel();
    let (intents_tx, intents_rx) = mpsc::unbounded_channel();

    let controller = ViewController::new(&config, transport, deliveries_tx);
    let (view_tx, view_rx) = watch::channel(controller.view(now_millis::<C>()));

    info!(
        driver_id = %config.driver_id,
        snapshot_url = %config.snapshot_url,
        ws_url = config.ws_url.as_deref().unwrap_or("<simulated>"),
        "Starting tracker"
    );

    let task = tokio::spawn(run_tracker::<C, S>(
        config,
        controller,
        source,
        cache,
        deliveries_rx,
        intents_rx,
        view_tx,
    ));

    Ok(TrackerHandle {
        intents: intents_tx,
        view: view_rx,
        task,
    })
}

async fn run_tracker<C, S>(
    config: TrackerConfig,
    mut controller: ViewController,
    source: Arc<S>,
    cache: Arc<SnapshotCache>,
    mut deliveries: mpsc::UnboundedReceiver<crate::transport::Delivery>,
    mut intents: mpsc::UnboundedReceiver<Intent>,
    view: watch::Sender<ViewModel>,
) where
    C: SystemResource + Into<EpochMillis> + Send + 'static,
    S: SnapshotSource + Send + Sync + 'static,
{
    let mut probe = interval_at(
        Instant::now() + config.probe_interval,
        config.probe_interval,
    );
    probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let fetch = cache.get_or_fetch(source.as_ref(), &config.snapshot_url);
    tokio::pin!(fetch);
    let mut fetched = false;

    loop {
        tokio::select! {
            result = &mut fetch, if !fetched => {
                fetched = true;
                match result {
                    Ok(snapshot) => controller.on_snapshot(snapshot, now_millis::<C>()),
                    Err(e) => controller.on_snapshot_error(&e),
                }
            }

            Some(delivery) = deliveries.recv() => {
                controller.handle_delivery(delivery);
            }

            _ = probe.tick() => {
                controller.probe(now_millis::<C>());
            }

            intent = intents.recv() => match intent {
                Some(intent) => {
                    debug!(?intent, "Intent");
                    controller.apply(intent, now_millis::<C>());
                }
                None => break,
            },
        }

        view.send_replace(controller.view(now_millis::<C>()));
    }

    controller.teardown();
    view.send_replace(controller.view(now_millis::<C>()));
    info!(driver_id = %config.driver_id, "Tracker stopped");
}
