// src/pipeline/engine.rs
//
// Violation engine for a single video source.
//
// Per frame the engine receives the tracker's full box list. Only sampling
// frames (one per second of footage) touch state:
//
//   observations ─▶ class filter ─▶ box sanity ─▶ TrackHistory (epoch N vs N-1)
//                                       │
//                                       ├─▶ footprint ∩ zone ─┐
//                                       └─▶ stationarity ─────┴─▶ ViolationTracker ─▶ evidence
//
// Track ids are only unique within one tracker, so every source owns its
// own engine. Nothing here is shared across sources.

use crate::analysis::footprint::IntersectionDetector;
use crate::analysis::stationarity::StationarityClassifier;
use crate::analysis::track_history::TrackHistory;
use crate::analysis::violation_tracker::{
    EpochOutcome, TimerState, TimerTransition, ViolationTracker,
};
use crate::error::{ConfigError, ObservationError};
use crate::evidence::{EvidenceEmitter, EvidenceSink};
use crate::pipeline::event_bus::{EngineEvent, EventBus};
use crate::pipeline::frame_context::FrameContext;
use crate::pipeline::metrics::EngineMetrics;
use crate::types::{BoundingBox, ClassConfig, Config, DetectionConfig, TrackKey, ViolationRecord};
use crate::zone::{ZoneMask, ZoneModel};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What a single `process_frame` call produced.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Epoch index when this was a sampling frame.
    pub epoch: Option<u64>,
    pub violations: Vec<ViolationRecord>,
}

impl FrameReport {
    pub fn sampled(&self) -> bool {
        self.epoch.is_some()
    }
}

pub struct ViolationEngine {
    zone: ZoneMask,
    detector: IntersectionDetector,
    classifier: StationarityClassifier,
    history: TrackHistory,
    tracker: ViolationTracker,
    emitter: EvidenceEmitter,
    classes: ClassConfig,
    detection: DetectionConfig,
    fps: f64,
    frames_per_epoch: u64,
    confirmed: Vec<ViolationRecord>,
    events: EventBus,
    metrics: EngineMetrics,
}

impl ViolationEngine {
    /// Build an engine for a source with the given frame size and rate.
    /// Fails if the zone does not fit the frame.
    pub fn new(config: &Config, width: u32, height: u32, fps: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ConfigError::InvalidFrameRate(fps));
        }

        let zone = ZoneModel::build(&config.zone.polygon, width, height)?;
        let det = &config.detection;
        let frames_per_epoch = (fps.round() as u64).max(1);

        info!(
            fps,
            frames_per_epoch,
            tolerance = det.stationarity_tolerance,
            threshold_s = det.dwell_threshold_seconds,
            margin = det.edge_margin,
            "Violation engine ready"
        );

        Ok(Self {
            zone,
            detector: IntersectionDetector::new(det.edge_margin),
            classifier: StationarityClassifier::new(det.stationarity_tolerance),
            history: TrackHistory::with_capacity(det.history_capacity),
            tracker: ViolationTracker::new(det.dwell_threshold_seconds, det.idle_reset_epochs),
            emitter: EvidenceEmitter::new(),
            classes: config.classes.clone(),
            detection: det.clone(),
            fps,
            frames_per_epoch,
            confirmed: Vec::new(),
            events: EventBus::new(config.events.max_pending),
            metrics: EngineMetrics::new(),
        })
    }

    pub fn is_sampling_frame(&self, frame_index: u64) -> bool {
        frame_index % self.frames_per_epoch == 0
    }

    pub fn process_frame(
        &mut self,
        ctx: &FrameContext,
        sink: &mut dyn EvidenceSink,
    ) -> FrameReport {
        self.metrics.inc(&self.metrics.total_frames);
        self.metrics.add(&self.metrics.observations, ctx.observations.len() as u64);

        if !self.is_sampling_frame(ctx.frame_index) {
            return FrameReport::default();
        }

        let epoch = ctx.frame_index / self.frames_per_epoch;
        let now_s = ctx.timestamp_s(self.fps);
        let prev_sample_s =
            epoch.saturating_sub(1) as f64 * self.frames_per_epoch as f64 / self.fps;
        self.metrics.inc(&self.metrics.sampled_epochs);

        let dropped = self.history.begin_epoch(epoch);
        if dropped > 0 {
            self.metrics.inc(&self.metrics.history_resets);
            self.events.publish(EngineEvent::HistoryReset { epoch, dropped });
        }

        let mut outcomes: HashMap<TrackKey, EpochOutcome> = HashMap::new();
        let mut boxes: HashMap<TrackKey, BoundingBox> = HashMap::new();

        for obs in &ctx.observations {
            if !self.detection.watches(obs.class_id) {
                continue;
            }
            let key = obs.key();
            if !obs.bbox.is_well_formed() {
                let err = ObservationError::Degenerate {
                    key,
                    bbox: obs.bbox,
                };
                warn!(frame = ctx.frame_index, "Skipping observation: {}", err);
                self.metrics.inc(&self.metrics.skipped_observations);
                self.events.publish(EngineEvent::ObservationSkipped {
                    frame_index: ctx.frame_index,
                    reason: err.to_string(),
                });
                continue;
            }

            let previous = self.history.record(epoch, key, obs.bbox);
            boxes.insert(key, obs.bbox);

            let outcome = if !self.detector.footprint_intersects(&obs.bbox, &self.zone) {
                EpochOutcome::NotQualifying
            } else {
                self.metrics.inc(&self.metrics.intersecting_tracks);
                match previous {
                    None => EpochOutcome::NoComparison,
                    Some(prev) if self.classifier.is_stationary(&obs.bbox, &prev) => {
                        self.metrics.inc(&self.metrics.stationary_tracks);
                        EpochOutcome::Qualifying {
                            since_s: prev_sample_s,
                        }
                    }
                    Some(_) => EpochOutcome::NotQualifying,
                }
            };
            outcomes.insert(key, outcome);
        }

        let transitions = self.tracker.update(&outcomes, now_s);
        let mut report = FrameReport {
            epoch: Some(epoch),
            violations: Vec::new(),
        };

        for transition in transitions {
            match transition {
                TimerTransition::Started { key, start_time_s } => {
                    self.events.publish(EngineEvent::DwellStarted { key, start_time_s });
                }
                TimerTransition::Abandoned { key, dwell_seconds } => {
                    self.events.publish(EngineEvent::DwellAbandoned { key, dwell_seconds });
                }
                TimerTransition::Confirmed {
                    key,
                    start_time_s,
                    dwell_seconds,
                } => {
                    let Some(bbox) = boxes.get(&key).copied() else {
                        continue;
                    };
                    let record = ViolationRecord {
                        class_id: key.class_id,
                        track_id: key.track_id,
                        label: self.label(key),
                        start_time_s,
                        confirmed_at_s: now_s,
                        dwell_seconds,
                        frame_index: ctx.frame_index,
                        bbox,
                    };
                    self.confirm(record.clone(), ctx, sink);
                    report.violations.push(record);
                }
            }
        }

        self.log_progress(&outcomes, now_s);
        report
    }

    fn confirm(
        &mut self,
        record: ViolationRecord,
        ctx: &FrameContext,
        sink: &mut dyn EvidenceSink,
    ) {
        self.metrics.inc(&self.metrics.violations);
        if !self.emitter.emit(&record, ctx.image.as_ref(), sink) {
            self.metrics.inc(&self.metrics.persistence_failures);
            self.events.publish(EngineEvent::PersistenceFailed {
                label: record.label.clone(),
            });
        }
        self.events.publish(EngineEvent::ViolationConfirmed(record.clone()));
        self.confirmed.push(record);
    }

    fn log_progress(&self, outcomes: &HashMap<TrackKey, EpochOutcome>, now_s: f64) {
        for (key, outcome) in outcomes {
            if !matches!(outcome, EpochOutcome::Qualifying { .. }) {
                continue;
            }
            if let Some(TimerState::Accumulating { start_time_s, .. }) = self.tracker.state(key) {
                debug!(
                    "{} stationary in zone since {:.2}s, dwell {:.2}s",
                    self.label(*key),
                    start_time_s,
                    now_s - start_time_s
                );
            }
        }
    }

    /// `{class_name}{track_id}`, e.g. `car12`.
    pub fn label(&self, key: TrackKey) -> String {
        format!("{}{}", self.classes.label(key.class_id), key.track_id)
    }

    /// Overlay text for every violation confirmed so far. Presentation only.
    pub fn alarm_labels(&self) -> Vec<String> {
        self.confirmed
            .iter()
            .map(|r| {
                format!(
                    "{} illegal parking for more than {:.2}s!",
                    r.label, r.dwell_seconds
                )
            })
            .collect()
    }

    pub fn violations(&self) -> &[ViolationRecord] {
        &self.confirmed
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn frames_per_epoch(&self) -> u64 {
        self.frames_per_epoch
    }

    pub fn active_timers(&self) -> usize {
        self.tracker.active_timers()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
