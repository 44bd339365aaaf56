// src/analysis/track_history.rs
//
// Per-track box memory across sampling epochs. Each sample is stored under
// (epoch, class, track) and compared against the entry exactly one epoch
// back.
//
// Growth is bounded by a coarse reset: once the store holds more than
// `capacity` entries it is cleared wholesale before the next epoch is
// written. Every track then misses one comparison. Dwell timers live in
// the violation tracker and are not rebuilt from here, so a reset never
// shortens or restarts a running timer.

use crate::types::{BoundingBox, SampleKey, TrackKey};
use std::collections::HashMap;
use tracing::info;

pub const DEFAULT_CAPACITY: usize = 10_000;

pub struct TrackHistory {
    samples: HashMap<SampleKey, BoundingBox>,
    capacity: usize,
    resets: u64,
}

impl Default for TrackHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TrackHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: HashMap::new(),
            capacity,
            resets: 0,
        }
    }

    /// Clear the store if it has outgrown its ceiling. Call once at the
    /// start of each sampling epoch, before `record`. Returns the number
    /// of entries dropped.
    pub fn begin_epoch(&mut self, epoch: u64) -> usize {
        if self.samples.len() <= self.capacity {
            return 0;
        }
        let dropped = self.samples.len();
        self.samples.clear();
        self.resets += 1;
        info!(
            epoch,
            dropped,
            capacity = self.capacity,
            "Track history over capacity, cleared"
        );
        dropped
    }

    /// Store `bbox` for this epoch and return the box from one epoch earlier.
    pub fn record(
        &mut self,
        epoch: u64,
        track: TrackKey,
        bbox: BoundingBox,
    ) -> Option<BoundingBox> {
        self.samples.insert(SampleKey::new(epoch, track), bbox);
        self.previous(epoch, track)
    }

    /// Box stored for `track` at `epoch - 1`, if any.
    pub fn previous(&self, epoch: u64, track: TrackKey) -> Option<BoundingBox> {
        let prev_epoch = epoch.checked_sub(1)?;
        self.samples
            .get(&SampleKey::new(prev_epoch, track))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(track_id: u64) -> TrackKey {
        TrackKey {
            class_id: 2,
            track_id,
        }
    }

    fn bbox(x: i32) -> BoundingBox {
        BoundingBox::new(x, 0, x + 10, 10)
    }

    #[test]
    fn test_first_epoch_has_no_previous() {
        let mut history = TrackHistory::with_capacity(100);
        history.begin_epoch(0);
        assert_eq!(history.record(0, key(1), bbox(0)), None);
        history.begin_epoch(1);
        assert_eq!(history.record(1, key(1), bbox(3)), Some(bbox(0)));
    }

    #[test]
    fn test_previous_is_exactly_one_epoch_back() {
        let mut history = TrackHistory::with_capacity(100);
        history.record(0, key(1), bbox(0));
        // skipped epoch 1: epoch 2 must not compare against epoch 0
        assert_eq!(history.record(2, key(1), bbox(0)), None);
    }

    #[test]
    fn test_keys_separate_class_and_track() {
        let mut history = TrackHistory::with_capacity(100);
        history.record(0, key(1), bbox(0));
        let other_class = TrackKey {
            class_id: 7,
            track_id: 1,
        };
        assert_eq!(history.record(1, other_class, bbox(0)), None);
        assert_eq!(history.record(1, key(2), bbox(0)), None);
    }

    #[test]
    fn test_capacity_reset_misses_exactly_once() {
        let mut history = TrackHistory::with_capacity(3);

        // epoch 0: four distinct keys, one more than capacity
        assert_eq!(history.begin_epoch(0), 0);
        for id in 0..4 {
            history.record(0, key(id), bbox(0));
        }

        // epoch 1: store is cleared before writing, comparisons miss
        assert_eq!(history.begin_epoch(1), 4);
        assert_eq!(history.resets(), 1);
        assert_eq!(history.record(1, key(0), bbox(0)), None);

        // epoch 2: comparisons resume
        assert_eq!(history.begin_epoch(2), 0);
        assert_eq!(history.record(2, key(0), bbox(0)), Some(bbox(0)));
    }
}
