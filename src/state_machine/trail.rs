use std::collections::VecDeque;

use crate::track::{LatLng, TrackPoint};

/// Upper bound on the space reserved up front; larger trails grow as points arrive.
const MAX_PREALLOC: usize = 64;

/// Bounded breadcrumb history. Oldest points are evicted first once the bound is exceeded.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrackPoint>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity.min(MAX_PREALLOC)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&TrackPoint> {
        self.points.back()
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.iter()
    }

    /// Positions in insertion order, ready to be drawn as a polyline.
    pub fn polyline(&self) -> Vec<LatLng> {
        self.points.iter().map(TrackPoint::lat_lng).collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(i: u64) -> TrackPoint {
        TrackPoint::basic(37.0 + i as f64 * 0.001, -122.0, i)
    }

    #[test]
    fn test_push_under_capacity() {
        let mut trail = Trail::new(30);
        assert!(trail.is_empty());

        trail.push(point(1));
        trail.push(point(2));

        assert_eq!(trail.len(), 2);
        assert_eq!(trail.latest().map(|p| p.timestamp), Some(2));
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut trail = Trail::new(30);
        for i in 1..=31 {
            trail.push(point(i));
        }

        assert_eq!(trail.len(), 30);
        let stamps: Vec<u64> = trail.points().map(|p| p.timestamp).collect();
        assert_eq!(stamps, (2..=31).collect::<Vec<_>>());
    }

    #[test]
    fn test_many_appends_keep_last_n_in_order() {
        let mut trail = Trail::new(5);
        for i in 0..100 {
            trail.push(point(i));
            assert!(trail.len() <= 5);
        }

        let stamps: Vec<u64> = trail.points().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![95, 96, 97, 98, 99]);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let mut trail = Trail::new(usize::MAX);
        assert_eq!(trail.capacity(), usize::MAX);

        for i in 0..100 {
            trail.push(point(i));
        }
        assert_eq!(trail.len(), 100);
        assert_eq!(trail.latest().map(|p| p.timestamp), Some(99));
    }

    #[test]
    fn test_bound_above_prealloc_still_evicts() {
        let mut trail = Trail::new(MAX_PREALLOC + 6);
        for i in 0..200 {
            trail.push(point(i));
        }

        assert_eq!(trail.len(), MAX_PREALLOC + 6);
        assert_eq!(trail.points().next().map(|p| p.timestamp), Some(200 - 70));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut trail = Trail::new(3);
        trail.push(point(7));
        trail.push(point(7));
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_polyline_and_clear() {
        let mut trail = Trail::new(3);
        trail.push(point(1));
        trail.push(point(2));

        let line = trail.polyline();
        assert_eq!(line.len(), 2);
        assert_eq!(line[0], point(1).lat_lng());

        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.capacity(), 3);
    }
}
