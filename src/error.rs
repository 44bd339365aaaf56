// src/error.rs
//
// Error taxonomy of the violation engine. Only configuration errors are
// fatal; observation and evidence errors are logged and isolated.

use crate::types::{BoundingBox, Point2D, TrackKey};
use thiserror::Error;

/// Startup errors. The engine refuses to initialize.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("zone polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("zone vertex {vertex:?} lies outside the {width}x{height} frame")]
    VertexOutOfFrame {
        vertex: Point2D,
        width: u32,
        height: u32,
    },

    #[error("invalid frame size {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("invalid source frame rate {0}")]
    InvalidFrameRate(f64),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// A single observation that cannot be used this epoch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObservationError {
    #[error("degenerate box {bbox:?} for track {key:?}")]
    Degenerate { key: TrackKey, bbox: BoundingBox },
}

/// Failure to persist violation evidence.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("evidence I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("frame buffer holds {actual} bytes, {width}x{height} RGB needs {expected}")]
    FrameBuffer {
        expected: usize,
        actual: usize,
        width: usize,
        height: usize,
    },

    #[error("snapshot crop {bbox:?} is empty for a {width}x{height} frame")]
    EmptyCrop {
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },
}
