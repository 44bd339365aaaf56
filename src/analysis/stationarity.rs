// src/analysis/stationarity.rs

use crate::types::BoundingBox;

/// Tracker box regression jitters by a few pixels per corner even for a
/// parked car; 50px of summed corner movement per second absorbs that.
pub const DEFAULT_TOLERANCE: i64 = 50;

#[derive(Debug, Clone, Copy)]
pub struct StationarityClassifier {
    tolerance: i64,
}

impl Default for StationarityClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl StationarityClassifier {
    pub fn new(tolerance: i64) -> Self {
        Self { tolerance }
    }

    /// L1 distance between the two boxes is within tolerance (inclusive).
    pub fn is_stationary(&self, current: &BoundingBox, previous: &BoundingBox) -> bool {
        current.l1_distance(previous) <= self.tolerance
    }
}
