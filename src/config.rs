use std::time::Duration;

use bon::Builder;

use crate::driver::DriverId;
use crate::snapshot::cache::DEFAULT_FRESHNESS;

pub const DEFAULT_BREADCRUMB_SIZE: usize = 30;
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_DRIVER_ID: &str = "D-42";

/// Errors raised while building or checking a [`TrackerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value that could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("breadcrumb size must be at least 1")]
    ZeroBreadcrumbSize,

    #[error("probe interval must be non-zero")]
    ZeroProbeInterval,
}

/// Configuration for a single tracker view.
#[derive(Debug, Clone, Builder)]
pub struct TrackerConfig {
    /// Driver being tracked.
    #[builder(into)]
    pub driver_id: DriverId,

    /// Where the baseline snapshot is loaded from. Paths under `/api/` are served by the
    /// built-in demo fixture.
    #[builder(into)]
    pub snapshot_url: String,

    /// Location feed endpoint. Only reported in logs while the simulator stands in for a
    /// real transport.
    #[builder(into)]
    pub ws_url: Option<String>,

    /// Maximum number of breadcrumb points kept for the trail.
    #[builder(default = DEFAULT_BREADCRUMB_SIZE)]
    pub breadcrumb_size: usize,

    /// Whether the camera follows the vehicle when the view opens.
    #[builder(default = true)]
    pub follow_mode_default: bool,

    /// How often the staleness probe runs.
    #[builder(default = DEFAULT_PROBE_INTERVAL)]
    pub probe_interval: Duration,

    /// How long a fetched snapshot is served from cache.
    #[builder(default = DEFAULT_FRESHNESS)]
    pub snapshot_freshness: Duration,
}

impl TrackerConfig {
    /// Build a configuration from `DRIVER_ID`, `SNAPSHOT_URL`, `WS_URL`, `BREADCRUMB_SIZE` and
    /// `FOLLOW_MODE`, falling back to the demo driver.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let driver_id = DriverId::from(
            lookup("DRIVER_ID").unwrap_or_else(|| DEFAULT_DRIVER_ID.to_string()),
        );
        let snapshot_url = lookup("SNAPSHOT_URL").unwrap_or_else(|| driver_id.demo_snapshot_path());

        let breadcrumb_size = match lookup("BREADCRUMB_SIZE") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "BREADCRUMB_SIZE",
                    value,
                })?,
            None => DEFAULT_BREADCRUMB_SIZE,
        };

        let follow_mode_default = match lookup("FOLLOW_MODE") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "FOLLOW_MODE",
                value,
            })?,
            None => true,
        };

        let config = Self::builder()
            .driver_id(driver_id)
            .snapshot_url(snapshot_url)
            .maybe_ws_url(lookup("WS_URL"))
            .breadcrumb_size(breadcrumb_size)
            .follow_mode_default(follow_mode_default)
            .build();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.breadcrumb_size == 0 {
            return Err(ConfigError::ZeroBreadcrumbSize);
        }
        if self.probe_interval.is_zero() {
            return Err(ConfigError::ZeroProbeInterval);
        }
        Ok(())
    }
}
