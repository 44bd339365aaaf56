// src/analysis/violation_tracker.rs
//
// Per-track dwell timers.
//
//   Idle (no entry) ──qualifying──▶ Accumulating ──dwell ≥ threshold──▶ Confirmed
//                                        │
//                                        └── `idle_reset_epochs` consecutive misses ──▶ Idle
//
// Confirmed is terminal: a track id alerts at most once for the lifetime of
// the tracker instance, however long it stays parked.

use crate::types::TrackKey;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// What one sampling epoch said about a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpochOutcome {
    /// In the zone and at rest relative to the previous sample, which was
    /// taken at `since_s`.
    Qualifying { since_s: f64 },
    /// Compared, but outside the zone or moving.
    NotQualifying,
    /// No previous-epoch box to compare against. Leaves timers untouched.
    NoComparison,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerState {
    Accumulating { start_time_s: f64, misses: u32 },
    Confirmed { start_time_s: f64, dwell_seconds: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerTransition {
    Started {
        key: TrackKey,
        start_time_s: f64,
    },
    Confirmed {
        key: TrackKey,
        start_time_s: f64,
        dwell_seconds: f64,
    },
    Abandoned {
        key: TrackKey,
        dwell_seconds: f64,
    },
}

pub struct ViolationTracker {
    timers: HashMap<TrackKey, TimerState>,
    threshold_s: f64,
    idle_reset_epochs: Option<u32>,
}

impl ViolationTracker {
    pub fn new(threshold_s: f64, idle_reset_epochs: Option<u32>) -> Self {
        Self {
            timers: HashMap::new(),
            threshold_s,
            idle_reset_epochs,
        }
    }

    /// Apply one sampling epoch. Tracks with a running timer that are absent
    /// from `outcomes` count as a miss. Transitions come back in track order.
    pub fn update(
        &mut self,
        outcomes: &HashMap<TrackKey, EpochOutcome>,
        now_s: f64,
    ) -> Vec<TimerTransition> {
        let mut ordered: BTreeMap<TrackKey, EpochOutcome> =
            outcomes.iter().map(|(k, o)| (*k, *o)).collect();
        for (key, state) in &self.timers {
            if matches!(state, TimerState::Accumulating { .. }) && !ordered.contains_key(key) {
                ordered.insert(*key, EpochOutcome::NotQualifying);
            }
        }

        let mut transitions = Vec::new();
        for (key, outcome) in ordered {
            match outcome {
                EpochOutcome::Qualifying { since_s } => {
                    self.on_qualifying(key, since_s, now_s, &mut transitions)
                }
                EpochOutcome::NotQualifying => self.on_miss(key, now_s, &mut transitions),
                EpochOutcome::NoComparison => {}
            }
        }
        transitions
    }

    fn on_qualifying(
        &mut self,
        key: TrackKey,
        since_s: f64,
        now_s: f64,
        transitions: &mut Vec<TimerTransition>,
    ) {
        let start_time_s = match self.timers.get(&key) {
            Some(TimerState::Confirmed { .. }) => return,
            Some(TimerState::Accumulating { start_time_s, .. }) => *start_time_s,
            None => {
                debug!(
                    class_id = key.class_id,
                    track_id = key.track_id,
                    "Dwell timer started at {:.2}s",
                    since_s
                );
                transitions.push(TimerTransition::Started {
                    key,
                    start_time_s: since_s,
                });
                since_s
            }
        };

        let dwell_seconds = now_s - start_time_s;
        if dwell_seconds >= self.threshold_s {
            warn!(
                class_id = key.class_id,
                track_id = key.track_id,
                "Violation confirmed: stationary since {:.2}s, dwell {:.2}s",
                start_time_s,
                dwell_seconds
            );
            self.timers.insert(
                key,
                TimerState::Confirmed {
                    start_time_s,
                    dwell_seconds,
                },
            );
            transitions.push(TimerTransition::Confirmed {
                key,
                start_time_s,
                dwell_seconds,
            });
        } else {
            self.timers.insert(
                key,
                TimerState::Accumulating {
                    start_time_s,
                    misses: 0,
                },
            );
        }
    }

    fn on_miss(&mut self, key: TrackKey, now_s: f64, transitions: &mut Vec<TimerTransition>) {
        let Some(TimerState::Accumulating {
            start_time_s,
            misses,
        }) = self.timers.get(&key).copied()
        else {
            return;
        };

        let misses = misses + 1;
        match self.idle_reset_epochs {
            Some(limit) if misses >= limit => {
                let dwell_seconds = now_s - start_time_s;
                info!(
                    class_id = key.class_id,
                    track_id = key.track_id,
                    "Dwell timer dropped after {} non-qualifying epoch(s), dwell was {:.2}s",
                    misses,
                    dwell_seconds
                );
                self.timers.remove(&key);
                transitions.push(TimerTransition::Abandoned { key, dwell_seconds });
            }
            _ => {
                self.timers.insert(
                    key,
                    TimerState::Accumulating {
                        start_time_s,
                        misses,
                    },
                );
            }
        }
    }

    pub fn state(&self, key: &TrackKey) -> Option<TimerState> {
        self.timers.get(key).copied()
    }

    pub fn is_confirmed(&self, key: &TrackKey) -> bool {
        matches!(self.timers.get(key), Some(TimerState::Confirmed { .. }))
    }

    pub fn active_timers(&self) -> usize {
        self.timers
            .values()
            .filter(|s| matches!(s, TimerState::Accumulating { .. }))
            .count()
    }

    pub fn confirmed_count(&self) -> usize {
        self.timers.len() - self.active_timers()
    }
}
