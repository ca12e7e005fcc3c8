use std::fmt::Display;
use std::sync::Arc;

/// Dispatch identifier of the driver on the map, e.g. `D-42`.
///
/// Opaque to the tracker. It picks the snapshot to load when no `SNAPSHOT_URL` is given and
/// stands in for the driver field of the view until the snapshot arrives.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DriverId(Arc<str>);

impl DriverId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this driver's record on the dispatch API, `/api/drivers/{id}`. The built-in demo
    /// source answers it without a network round trip.
    pub fn demo_snapshot_path(&self) -> String {
        format!("/api/drivers/{}", self.0)
    }
}

impl Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DriverId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for DriverId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}
