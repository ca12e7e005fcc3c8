//! The seam between the tracker and whatever produces location messages.
//!
//! A [`Transport`] is started with a [`MessageSink`] and returns a [`StreamHandle`]. Everything
//! the transport produces goes through the sink as a [`Delivery`] tagged with the subscription
//! it belongs to, so a consumer can tell a live subscription's traffic from leftovers of a
//! cancelled one.
//!
//! Two implementations ship with the crate:
//! - [`SimulatedTransport`](simulator::SimulatedTransport) drives a fake vehicle on a timer.
//! - [`FramedTransport`](framed::FramedTransport) decodes raw frames from any connector, which is
//!   how a real socket plugs in.

pub mod error;
pub mod framed;
pub mod simulator;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

use self::error::FrameError;
use crate::track::{StreamMessage, TrackPoint};

/// Identifies one start of a transport. A resume after pause gets a fresh id.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options passed to [`Transport::start`].
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Where the stream should pick up from, usually the last known position.
    pub start: Option<TrackPoint>,
}

/// A single item produced by a transport.
#[derive(Debug)]
pub struct Delivery {
    pub subscription: SubscriptionId,
    pub payload: Result<StreamMessage, FrameError>,
}

/// The receiving end handed to a transport when it is started.
#[derive(Debug, Clone)]
pub struct MessageSink {
    subscription: SubscriptionId,
    tx: mpsc::UnboundedSender<Delivery>,
    cancelled: Arc<AtomicBool>,
}

impl MessageSink {
    pub fn new(subscription: SubscriptionId, tx: mpsc::UnboundedSender<Delivery>) -> Self {
        Self {
            subscription,
            tx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscription(&self) -> &SubscriptionId {
        &self.subscription
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Forward `payload` to the consumer.
    ///
    /// Returns `false` once the subscription is cancelled or the consumer is gone, after which
    /// the transport should stop producing.
    pub fn deliver(&self, payload: Result<StreamMessage, FrameError>) -> bool {
        if self.is_cancelled() {
            return false;
        }

        self.tx
            .send(Delivery {
                subscription: self.subscription,
                payload,
            })
            .is_ok()
    }
}

/// Cancellation handle for a started transport.
///
/// [`cancel`](Self::cancel) may be called any number of times. Dropping the handle cancels too.
#[derive(Debug)]
pub struct StreamHandle {
    subscription: SubscriptionId,
    cancelled: Arc<AtomicBool>,
    task: Option<AbortHandle>,
}

impl StreamHandle {
    /// A handle controlling `sink` with no background task attached.
    pub fn for_sink(sink: &MessageSink) -> Self {
        Self {
            subscription: sink.subscription,
            cancelled: Arc::clone(&sink.cancelled),
            task: None,
        }
    }

    /// Also abort `task` on cancellation.
    pub fn attach(mut self, task: AbortHandle) -> Self {
        self.task = Some(task);
        self
    }

    pub fn subscription(&self) -> &SubscriptionId {
        &self.subscription
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!(subscription = %self.subscription, "Stream cancelled");
        }
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Something that can produce location messages on demand.
pub trait Transport: Send + Sync {
    /// Begin delivering messages into `sink`, in generation order, until the returned handle is
    /// cancelled.
    fn start(&self, sink: MessageSink, options: StartOptions) -> StreamHandle;
}

/// Spawn a task that forwards every item of `stream` into `sink` until either side stops.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_pump<S>(stream: S, sink: MessageSink) -> StreamHandle
where
    S: Stream<Item = Result<StreamMessage, FrameError>> + Send + 'static,
{
    let handle = StreamHandle::for_sink(&sink);

    let task = tokio::spawn(async move {
        let mut stream = std::pin::pin!(stream);
        while let Some(payload) = stream.next().await {
            if !sink.deliver(payload) {
                break;
            }
        }
        debug!(subscription = %sink.subscription(), "Stream pump finished");
    });

    handle.attach(task.abort_handle())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat(timestamp: u64) -> Result<StreamMessage, FrameError> {
        Ok(StreamMessage::Heartbeat { timestamp })
    }

    #[test]
    fn test_sink_delivers_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = MessageSink::new(SubscriptionId::generate(), tx);
        let handle = StreamHandle::for_sink(&sink);

        assert!(sink.deliver(heartbeat(1)));
        let delivery = rx.try_recv().unwrap();
        assert_eq!(&delivery.subscription, sink.subscription());

        handle.cancel();
        assert!(sink.is_cancelled());
        assert!(!sink.deliver(heartbeat(2)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscription_ids_are_distinct_values() {
        let first = SubscriptionId::generate();
        let copy = first;
        let second = SubscriptionId::generate();

        assert_eq!(first, copy);
        assert_ne!(first, second);
        assert_eq!(first.to_string(), first.as_uuid().to_string());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = MessageSink::new(SubscriptionId::generate(), tx);
        let handle = StreamHandle::for_sink(&sink);

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_drop_cancels() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = MessageSink::new(SubscriptionId::generate(), tx);
        drop(StreamHandle::for_sink(&sink));
        assert!(sink.is_cancelled());
    }

    #[test]
    fn test_deliver_fails_without_consumer() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = MessageSink::new(SubscriptionId::generate(), tx);
        drop(rx);
        assert!(!sink.deliver(heartbeat(1)));
    }

    #[tokio::test]
    async fn test_pump_preserves_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = MessageSink::new(SubscriptionId::generate(), tx);

        let items = futures::stream::iter((1..=5).map(heartbeat));
        let _handle = spawn_pump(items, sink);

        let mut seen = Vec::new();
        while seen.len() < 5 {
            let delivery = rx.recv().await.unwrap();
            seen.push(delivery.payload.unwrap().timestamp());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }
}
