//! Position types shared by the stream, the trail and the view.
//!
//! The serde attributes pin the JSON shape the location feed uses on the wire:
//!
//! ```text
//! {"type":"location","lat":37.78,"lng":-122.40,"speedKph":61.2,"heading":112.0,"accuracyM":14.1,"timestamp":1700000000000}
//! {"type":"heartbeat","timestamp":1700000000000}
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::transport::error::FrameError;

/// A bare coordinate pair, used for polylines and camera targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A single observed position of the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kph: Option<f64>,
    /// Degrees, `[0, 360)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

/// Indicates that a point cannot be placed on a map.
#[derive(Debug, thiserror::Error)]
#[error("invalid coordinates ({lat}, {lng})")]
pub struct InvalidPoint {
    pub lat: f64,
    pub lng: f64,
}

impl TrackPoint {
    /// A point with only the required fields set.
    pub fn basic(lat: f64, lng: f64, timestamp: u64) -> Self {
        Self {
            lat,
            lng,
            speed_kph: None,
            heading: None,
            accuracy_m: None,
            timestamp,
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Check that the coordinates are finite and within WGS84 bounds.
    pub fn validate(&self) -> Result<(), InvalidPoint> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);

        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(InvalidPoint {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// One message of the one-way location feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamMessage {
    Location(TrackPoint),
    /// Keep-alive with no positional payload.
    Heartbeat { timestamp: u64 },
}

impl StreamMessage {
    pub fn timestamp(&self) -> u64 {
        match self {
            StreamMessage::Location(point) => point.timestamp,
            StreamMessage::Heartbeat { timestamp } => *timestamp,
        }
    }

    /// Decode a single wire frame.
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        serde_json::from_slice(frame).map_err(|source| FrameError {
            len: frame.len(),
            source,
        })
    }

    /// Encode into a single wire frame.
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_location_frame() {
        let frame = br#"{"type":"location","lat":37.781,"lng":-122.404,"speedKph":63,"heading":110,"timestamp":1700000000000}"#;
        let message = StreamMessage::decode(frame).unwrap();

        let StreamMessage::Location(point) = message else {
            panic!("expected a location message");
        };
        assert_eq!(point.lat, 37.781);
        assert_eq!(point.speed_kph, Some(63.0));
        assert_eq!(point.heading, Some(110.0));
        assert_eq!(point.accuracy_m, None);
        assert_eq!(point.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_decode_heartbeat_frame() {
        let message = StreamMessage::decode(br#"{"type":"heartbeat","timestamp":42}"#).unwrap();
        assert_eq!(message, StreamMessage::Heartbeat { timestamp: 42 });
        assert_eq!(message.timestamp(), 42);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let frame = br#"{"type":"teleport","timestamp":1}"#;
        let err = StreamMessage::decode(frame).unwrap_err();
        assert_eq!(err.len, frame.len());
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let mut point = TrackPoint::basic(1.0, 2.0, 3);
        point.accuracy_m = Some(12.5);

        let frame = StreamMessage::Location(point).encode().unwrap();
        let text = std::str::from_utf8(&frame).unwrap();

        assert!(text.contains(r#""type":"location""#));
        assert!(text.contains(r#""accuracyM":12.5"#));
        assert!(!text.contains("speedKph"));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(TrackPoint::basic(37.7, -122.4, 0).validate().is_ok());
        assert!(TrackPoint::basic(91.0, 0.0, 0).validate().is_err());
        assert!(TrackPoint::basic(0.0, -180.5, 0).validate().is_err());
        assert!(TrackPoint::basic(f64::NAN, 0.0, 0).validate().is_err());
    }
}
