// src/analysis/mod.rs
//
// Per-epoch analysis stages of the violation engine.
//
// Signal flow:
//   tracked box ─▶ footprint (bottom edge ∩ zone) ──┐
//               └▶ track_history ─▶ stationarity ───┴▶ violation_tracker
//
// Orchestrated by pipeline::engine::ViolationEngine.

pub mod footprint;
pub mod stationarity;
pub mod track_history;
pub mod violation_tracker;

pub use footprint::IntersectionDetector;
pub use stationarity::StationarityClassifier;
pub use track_history::TrackHistory;
pub use violation_tracker::{EpochOutcome, TimerState, TimerTransition, ViolationTracker};
