// src/lib.rs
//
// Illegal-parking detection over a stream of tracked objects.
//
// The external tracker hands over every tracked box per frame; once per
// second of footage the engine checks which boxes stand inside the
// restricted zone without moving, times how long they stay, and emits one
// violation record (plus a snapshot request) per track that outstays the
// dwell threshold.

pub mod analysis;
pub mod config;
pub mod error;
pub mod evidence;
pub mod pipeline;
pub mod source;
pub mod types;
pub mod zone;

pub use error::{ConfigError, EvidenceError, ObservationError};
pub use evidence::{EvidenceEmitter, EvidenceSink, FileEvidenceSink, SnapshotRequest};
pub use pipeline::{EngineEvent, FrameContext, FrameImage, FrameReport, ViolationEngine};
pub use types::{BoundingBox, Config, Point2D, TrackKey, TrackObservation, ViolationRecord};
pub use zone::{ZoneMask, ZoneModel};
