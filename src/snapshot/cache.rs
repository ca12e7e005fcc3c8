use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::error::SnapshotError;
use super::{DriverSnapshot, SnapshotSource};

pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedSnapshot {
    snapshot: Arc<DriverSnapshot>,
    fetched_at: Instant,
}

/// Snapshots keyed by the URL they were fetched from.
///
/// An entry younger than the freshness window is served without refetching, so remounting a
/// view right after closing it does not hit the network again. Failed fetches are never cached.
///
/// The cache is created by the application and passed to whoever needs it; dropping it (or
/// calling [`clear`](Self::clear)) ends its lifetime.
#[derive(Debug)]
pub struct SnapshotCache {
    entries: DashMap<String, CachedSnapshot, ahash::RandomState>,
    freshness: Duration,
}

impl SnapshotCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            entries: DashMap::default(),
            freshness,
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Return the cached snapshot for `url` if still fresh, otherwise fetch it through `source`.
    pub async fn get_or_fetch<S>(
        &self,
        source: &S,
        url: &str,
    ) -> Result<Arc<DriverSnapshot>, SnapshotError>
    where
        S: SnapshotSource + Sync,
    {
        if let Some(snapshot) = self.fresh(url) {
            debug!(url = %url, "Snapshot cache hit");
            return Ok(snapshot);
        }

        let snapshot = Arc::new(source.fetch(url).await?);
        self.entries.insert(
            url.to_string(),
            CachedSnapshot {
                snapshot: Arc::clone(&snapshot),
                fetched_at: Instant::now(),
            },
        );

        Ok(snapshot)
    }

    fn fresh(&self, url: &str) -> Option<Arc<DriverSnapshot>> {
        self.entries
            .get(url)
            .filter(|entry| entry.fetched_at.elapsed() < self.freshness)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Forget the entry for `url`. Returns whether one was present.
    pub fn invalidate(&self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS)
    }
}
