pub mod config;
pub mod driver;
pub mod snapshot;
pub mod state_machine;
pub mod track;
pub mod tracker;
pub mod transport;
pub mod view;

pub use config::{ConfigError, TrackerConfig};
pub use driver::DriverId;
pub use snapshot::cache::SnapshotCache;
pub use snapshot::{DriverSnapshot, HttpSnapshotSource, SnapshotSource};
pub use state_machine::connection::{ConnectionEvent, ConnectionState, ConnectionStatus};
pub use track::{LatLng, StreamMessage, TrackPoint};
pub use tracker::{TrackerHandle, spawn_tracker, spawn_tracker_with_clock};
pub use transport::{StreamHandle, Transport};
pub use view::model::ViewModel;
pub use view::{Intent, ViewController};
