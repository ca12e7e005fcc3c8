//! The one-time baseline record for the tracked driver, fetched independently of the live
//! stream.

pub mod cache;
pub mod error;

use std::future::Future;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use self::error::SnapshotError;
use crate::state_machine::wrappers::input::system::{EpochMillis, SystemResource};
use crate::track::TrackPoint;

/// Paths with this prefix are answered by the built-in demo fixture instead of the network.
pub const DEMO_PATH_PREFIX: &str = "/api/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSnapshot {
    pub driver_id: String,
    pub name: String,
    pub equipment: String,
    pub last_known: TrackPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_iso: Option<String>,
}

impl DriverSnapshot {
    /// The parsed ETA, if present and well formed.
    pub fn eta(&self) -> Option<DateTime<FixedOffset>> {
        self.eta_iso
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    /// The fixture served for demo paths: a dry van heading across the bay, last seen 15 s
    /// before `now` and due in an hour.
    pub fn demo(driver_id: &str, now: u64) -> Self {
        let eta = i64::try_from(now)
            .ok()
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms + 60 * 60 * 1000))
            .map(|eta| eta.to_rfc3339_opts(SecondsFormat::Millis, true));

        Self {
            driver_id: driver_id.to_string(),
            name: "Alex P.".to_string(),
            equipment: "53' Dry Van".to_string(),
            last_known: TrackPoint {
                lat: 37.781,
                lng: -122.404,
                speed_kph: Some(63.0),
                heading: Some(110.0),
                accuracy_m: None,
                timestamp: now.saturating_sub(15_000),
            },
            destination: Some(Destination {
                name: "Oakland DC".to_string(),
                lat: 37.798,
                lng: -122.276,
            }),
            eta_iso: eta,
        }
    }
}

/// Something that can load a [`DriverSnapshot`] from a location.
pub trait SnapshotSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<DriverSnapshot, SnapshotError>> + Send;
}

/// Loads snapshots over HTTP, answering demo paths locally.
#[derive(Debug, Clone, Default)]
pub struct HttpSnapshotSource {
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, url: &str) -> Result<DriverSnapshot, SnapshotError> {
        if let Some(path) = url.strip_prefix(DEMO_PATH_PREFIX) {
            let driver_id = path.rsplit('/').next().unwrap_or(path);
            let EpochMillis(now) = EpochMillis::generate();
            debug!(driver_id = %driver_id, "Serving demo snapshot");
            return Ok(DriverSnapshot::demo(driver_id, now));
        }

        let parsed = Url::parse(url).map_err(|source| SnapshotError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        info!(url = %parsed, "Fetching driver snapshot");

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn test_demo_snapshot() {
        let snapshot = DriverSnapshot::demo("D-42", NOW);
        assert_eq!(snapshot.driver_id, "D-42");
        assert_eq!(snapshot.last_known.timestamp, NOW - 15_000);

        let eta = snapshot.eta().unwrap();
        assert_eq!(eta.timestamp_millis(), (NOW + 3_600_000) as i64);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "driverId": "D-7",
            "name": "Sam",
            "equipment": "Reefer",
            "lastKnown": {"lat": 1.5, "lng": 2.5, "timestamp": 99},
            "etaIso": "2024-05-01T10:00:00Z"
        }"#;
        let snapshot: DriverSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.driver_id, "D-7");
        assert_eq!(snapshot.last_known.lat, 1.5);
        assert!(snapshot.destination.is_none());
        assert!(snapshot.eta().is_some());
    }

    #[test]
    fn test_bad_eta_is_ignored() {
        let mut snapshot = DriverSnapshot::demo("D-1", NOW);
        snapshot.eta_iso = Some("tomorrow-ish".to_string());
        assert!(snapshot.eta().is_none());
    }

    #[tokio::test]
    async fn test_demo_path_served_locally() {
        let source = HttpSnapshotSource::new();
        let snapshot = source.fetch("/api/drivers/D-42").await.unwrap();
        assert_eq!(snapshot.driver_id, "D-42");
        assert_eq!(snapshot.name, "Alex P.");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let source = HttpSnapshotSource::new();
        let err = source.fetch("drivers/D-42").await.unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidUrl { .. }));
    }
}
