// src/pipeline/event_bus.rs
//
// Decoupled event queue. The engine publishes what happened during a frame;
// the host loop drains and reports it without reaching into engine state.

use crate::types::{TrackKey, ViolationRecord};
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    DwellStarted {
        key: TrackKey,
        start_time_s: f64,
    },

    DwellAbandoned {
        key: TrackKey,
        dwell_seconds: f64,
    },

    ViolationConfirmed(ViolationRecord),

    HistoryReset {
        epoch: u64,
        dropped: usize,
    },

    ObservationSkipped {
        frame_index: u64,
        reason: String,
    },

    PersistenceFailed {
        label: String,
    },
}

pub struct EventBus {
    events: VecDeque<EngineEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: EngineEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_oldest_when_full() {
        let mut bus = EventBus::new(2);
        for epoch in 0..3 {
            bus.publish(EngineEvent::HistoryReset { epoch, dropped: 0 });
        }
        assert_eq!(bus.pending_count(), 2);
        let drained = bus.drain();
        assert!(matches!(drained[0], EngineEvent::HistoryReset { epoch: 1, .. }));
        assert_eq!(bus.pending_count(), 0);
    }
}
