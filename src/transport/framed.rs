use std::fmt;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{info, warn};

use super::{MessageSink, StartOptions, StreamHandle, Transport, spawn_pump};
use crate::track::StreamMessage;

/// Adapts a connector producing raw frames into a [`Transport`].
///
/// The connector is called on every start (so once per resume) with the start options and
/// returns a stream of frames. Each frame is decoded as a [`StreamMessage`]; frames that fail to
/// decode are delivered as errors and the stream keeps going.
///
/// # Example
/// ```ignore
/// let transport = FramedTransport::new(|_options| {
///     let socket = open_socket(WS_URL);
///     socket.frames()
/// });
/// ```
pub struct FramedTransport<F> {
    connector: F,
}

impl<F> FramedTransport<F> {
    pub fn new(connector: F) -> Self {
        Self { connector }
    }
}

impl<F> fmt::Debug for FramedTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedTransport")
            .field("connector", &"<connector>")
            .finish()
    }
}

impl<F, S> Transport for FramedTransport<F>
where
    F: Fn(&StartOptions) -> S + Send + Sync,
    S: Stream<Item = Bytes> + Send + 'static,
{
    fn start(&self, sink: MessageSink, options: StartOptions) -> StreamHandle {
        info!(subscription = %sink.subscription(), "Starting framed location stream");

        let messages = (self.connector)(&options).map(|frame| {
            let decoded = StreamMessage::decode(&frame);
            if let Err(e) = &decoded {
                warn!(error = %e, "Undecodable frame");
            }
            decoded
        });

        spawn_pump(messages, sink)
    }
}
