// src/types.rs

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub zone: ZoneConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub classes: ClassConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub events: EventConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Closed polygon in frame pixel space, at least three vertices
    pub polygon: Vec<Point2D>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Max L1 box displacement (px) between two samples still counted as "not moving"
    #[serde(default = "default_stationarity_tolerance")]
    pub stationarity_tolerance: i64,
    #[serde(default = "default_dwell_threshold_seconds")]
    pub dwell_threshold_seconds: f64,
    /// Inward trim (px) applied to both ends of the footprint segment
    #[serde(default = "default_edge_margin")]
    pub edge_margin: i32,
    /// Entry count above which the whole track history is cleared
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Consecutive non-qualifying epochs before a running timer is dropped.
    /// `None` keeps timers latched until the engine is torn down.
    #[serde(default = "default_idle_reset_epochs")]
    pub idle_reset_epochs: Option<u32>,
    /// Only these class ids are considered; empty means every class
    #[serde(default)]
    pub watched_class_ids: Vec<u32>,
}

fn default_stationarity_tolerance() -> i64 {
    50
}

fn default_dwell_threshold_seconds() -> f64 {
    5.0
}

fn default_edge_margin() -> i32 {
    25
}

fn default_history_capacity() -> usize {
    10_000
}

fn default_idle_reset_epochs() -> Option<u32> {
    Some(1)
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            stationarity_tolerance: default_stationarity_tolerance(),
            dwell_threshold_seconds: default_dwell_threshold_seconds(),
            edge_margin: default_edge_margin(),
            history_capacity: default_history_capacity(),
            idle_reset_epochs: default_idle_reset_epochs(),
            watched_class_ids: Vec::new(),
        }
    }
}

impl DetectionConfig {
    pub fn watches(&self, class_id: u32) -> bool {
        self.watched_class_ids.is_empty() || self.watched_class_ids.contains(&class_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfig {
    #[serde(default = "default_class_names")]
    pub names: Vec<String>,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            names: default_class_names(),
        }
    }
}

impl ClassConfig {
    /// Display name for a class id; unknown ids fall back to `class{id}`.
    pub fn label(&self, class_id: u32) -> String {
        self.names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("class{}", class_id))
    }
}

fn default_class_names() -> Vec<String> {
    // COCO ordering, as emitted by the upstream detector
    [
        "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
        "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
        "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
        "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
        "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
        "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
        "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
        "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
        "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
        "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
        "toothbrush",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_dir")]
    pub dir: String,
}

fn default_input_dir() -> String {
    "input".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: default_input_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    #[serde(default = "default_snapshot_quality")]
    pub snapshot_quality: u8,
}

fn default_output_dir() -> String {
    "runs/violations".to_string()
}

fn default_true() -> bool {
    true
}

fn default_snapshot_quality() -> u8 {
    90
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            save_snapshots: true,
            snapshot_quality: default_snapshot_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

fn default_max_pending() -> usize {
    256
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Integer pixel coordinate. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point2D {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for [i32; 2] {
    fn from(p: Point2D) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned box `[x1, y1, x2, y2]` in frame pixels.
///
/// Tracker output is fractional; coordinates are truncated toward zero on
/// the way in, the same way the tracker's boxes are cast when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_well_formed(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Ground-contact edge, trimmed inward by `margin` at both ends.
    /// Saturates instead of overflowing for boxes near the `i32` limits.
    pub fn footprint(&self, margin: i32) -> (Point2D, Point2D) {
        (
            Point2D::new(self.x1.saturating_add(margin), self.y2),
            Point2D::new(self.x2.saturating_sub(margin), self.y2),
        )
    }

    /// Sum of absolute per-coordinate differences.
    pub fn l1_distance(&self, other: &BoundingBox) -> i64 {
        (self.x1 as i64 - other.x1 as i64).abs()
            + (self.y1 as i64 - other.y1 as i64).abs()
            + (self.x2 as i64 - other.x2 as i64).abs()
            + (self.y2 as i64 - other.y2 as i64).abs()
    }

    /// Intersection with `[0, width) x [0, height)`, or `None` if empty.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x1 = self.x1.clamp(0, width as i32);
        let y1 = self.y1.clamp(0, height as i32);
        let x2 = self.x2.clamp(0, width as i32);
        let y2 = self.y2.clamp(0, height as i32);
        if x2 > x1 && y2 > y1 {
            Some(BoundingBox::new(x1, y1, x2, y2))
        } else {
            None
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(b: [f64; 4]) -> Self {
        Self::new(b[0] as i32, b[1] as i32, b[2] as i32, b[3] as i32)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

// ============================================================================
// TRACKS
// ============================================================================

/// One tracked object on one frame, as handed over by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackObservation {
    pub track_id: u64,
    pub class_id: u32,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub frame_index: u64,
}

impl TrackObservation {
    pub fn key(&self) -> TrackKey {
        TrackKey {
            class_id: self.class_id,
            track_id: self.track_id,
        }
    }
}

/// Identity of a track within one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TrackKey {
    pub class_id: u32,
    pub track_id: u64,
}

/// Identity of one stored history sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleKey {
    pub epoch: u64,
    pub track: TrackKey,
}

impl SampleKey {
    pub fn new(epoch: u64, track: TrackKey) -> Self {
        Self { epoch, track }
    }
}

/// Confirmed illegal-parking event. Created once per track, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationRecord {
    pub class_id: u32,
    pub track_id: u64,
    /// `{class_name}{track_id}`, also the snapshot file stem
    pub label: String,
    /// Video time (s) at which the track was first seen at rest in the zone
    pub start_time_s: f64,
    /// Video time (s) of the confirming sample
    pub confirmed_at_s: f64,
    pub dwell_seconds: f64,
    pub frame_index: u64,
    pub bbox: BoundingBox,
}

/// Decoded RGB8 frame pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}
