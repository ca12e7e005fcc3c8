//! Read-only data handed to the rendering surface.

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;

use crate::state_machine::connection::ConnectionStatus;
use crate::track::{LatLng, TrackPoint};

/// Placeholder for any value that is not known yet.
pub const PLACEHOLDER: &str = "—";

/// Colour family of the status chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Success,
    Warning,
    Error,
    Default,
}

impl From<ConnectionStatus> for StatusTone {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Live => StatusTone::Success,
            ConnectionStatus::Degraded => StatusTone::Warning,
            ConnectionStatus::Error => StatusTone::Error,
            ConnectionStatus::Idle | ConnectionStatus::Connecting | ConnectionStatus::Paused => {
                StatusTone::Default
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub driver_id: String,
    pub name: String,
    pub equipment: String,

    pub status: ConnectionStatus,
    pub status_text: &'static str,
    pub status_tone: StatusTone,
    pub connection_error: Option<String>,

    pub current: Option<TrackPoint>,
    /// Current point, else the snapshot's last known point.
    pub center: Option<TrackPoint>,
    /// Where the map camera should be.
    pub camera: Option<LatLng>,
    pub trail: Vec<LatLng>,
    /// Radius of the accuracy circle around the current point.
    pub accuracy_m: Option<f64>,

    pub breadcrumb_count: usize,
    pub speed_text: String,
    pub heading_text: String,
    pub last_update_text: String,
    pub destination: String,
    pub eta_text: String,

    pub follow: bool,
    pub paused: bool,
    pub loading: bool,
    pub snapshot_error: Option<String>,
}

pub fn speed_text(point: Option<&TrackPoint>) -> String {
    point
        .and_then(|p| p.speed_kph)
        .map_or_else(|| PLACEHOLDER.to_string(), |kph| format!("{} km/h", kph.round()))
}

pub fn heading_text(point: Option<&TrackPoint>) -> String {
    point
        .and_then(|p| p.heading)
        .map_or_else(|| PLACEHOLDER.to_string(), |deg| format!("{}°", deg.round()))
}

/// Relative age of `timestamp` as seen at `now`, both in epoch milliseconds.
pub fn fmt_ago(timestamp: Option<u64>, now: u64) -> String {
    let Some(timestamp) = timestamp else {
        return PLACEHOLDER.to_string();
    };

    let diff = now.saturating_sub(timestamp);
    if diff < 1_000 {
        return "just now".to_string();
    }

    let secs = diff / 1_000;
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    format!("{}h ago", mins / 60)
}

/// ETA as local wall-clock time.
pub fn eta_text(eta: Option<DateTime<FixedOffset>>) -> String {
    eta.map_or_else(
        || PLACEHOLDER.to_string(),
        |eta| eta.with_timezone(&Local).format("%H:%M:%S").to_string(),
    )
}
