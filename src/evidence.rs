// src/evidence.rs
//
// Violation evidence: one JSON line per confirmed violation plus a JPEG crop
// of the offending object. Persistence is best-effort and synchronous; a
// failed write is logged and the violation stays confirmed in memory, so an
// outage loses that record instead of re-alerting on every epoch.

use crate::error::EvidenceError;
use crate::pipeline::frame_context::FrameImage;
use crate::types::{BoundingBox, ViolationRecord};
use image::{ImageBuffer, RgbImage};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const RECORD_LOG_NAME: &str = "violations.jsonl";

/// Ask the sink to crop the confirming frame at `bbox` and store it as `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub name: String,
    pub bbox: BoundingBox,
    pub frame_index: u64,
}

impl SnapshotRequest {
    pub fn for_record(record: &ViolationRecord) -> Self {
        Self {
            name: record.label.clone(),
            bbox: record.bbox,
            frame_index: record.frame_index,
        }
    }
}

/// Durable storage for violation evidence.
pub trait EvidenceSink {
    fn persist(
        &mut self,
        record: &ViolationRecord,
        snapshot: &SnapshotRequest,
        image: Option<&FrameImage>,
    ) -> Result<(), EvidenceError>;
}

/// Hands confirmed violations to a sink and logs the outcome.
#[derive(Debug, Default)]
pub struct EvidenceEmitter;

impl EvidenceEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never propagates: returns `false` when the sink failed.
    pub fn emit(
        &self,
        record: &ViolationRecord,
        image: Option<&FrameImage>,
        sink: &mut dyn EvidenceSink,
    ) -> bool {
        let snapshot = SnapshotRequest::for_record(record);
        match sink.persist(record, &snapshot, image) {
            Ok(()) => {
                info!(
                    label = %record.label,
                    dwell_s = record.dwell_seconds,
                    "Violation evidence saved"
                );
                true
            }
            Err(e) => {
                error!(label = %record.label, "Failed to persist violation evidence: {}", e);
                false
            }
        }
    }
}

#[derive(Serialize)]
struct RecordLine<'a> {
    logged_at: String,
    #[serde(flatten)]
    record: &'a ViolationRecord,
}

/// Writes `violations.jsonl` and `{label}.jpg` crops into one directory.
pub struct FileEvidenceSink {
    dir: PathBuf,
    log: BufWriter<File>,
    save_snapshots: bool,
    quality: u8,
}

impl FileEvidenceSink {
    pub fn create(dir: &Path, save_snapshots: bool, quality: u8) -> Result<Self, EvidenceError> {
        fs::create_dir_all(dir)?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(RECORD_LOG_NAME))?;
        info!("Evidence directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            log: BufWriter::new(log),
            save_snapshots,
            quality,
        })
    }

    fn append_record(&mut self, record: &ViolationRecord) -> Result<(), EvidenceError> {
        let line = RecordLine {
            logged_at: chrono::Utc::now().to_rfc3339(),
            record,
        };
        let json_line = serde_json::to_string(&line)?;
        writeln!(self.log, "{}", json_line)?;
        self.log.flush()?;
        Ok(())
    }

    fn save_snapshot(
        &self,
        snapshot: &SnapshotRequest,
        image: &FrameImage,
    ) -> Result<PathBuf, EvidenceError> {
        let frame = load_rgb(image)?;
        let crop = crop_rgb(&frame, snapshot.bbox)?;

        let path = self.dir.join(format!("{}.jpg", file_stem(&snapshot.name)));
        let mut out = BufWriter::new(File::create(&path)?);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.quality);
        crop.write_with_encoder(encoder)?;
        out.flush()?;
        Ok(path)
    }
}

impl EvidenceSink for FileEvidenceSink {
    fn persist(
        &mut self,
        record: &ViolationRecord,
        snapshot: &SnapshotRequest,
        image: Option<&FrameImage>,
    ) -> Result<(), EvidenceError> {
        self.append_record(record)?;

        if !self.save_snapshots {
            return Ok(());
        }
        match image {
            Some(image) => {
                let path = self.save_snapshot(snapshot, image)?;
                debug!("Snapshot written to {}", path.display());
            }
            None => debug!(
                frame = snapshot.frame_index,
                "No pixels for frame, snapshot of {} skipped", snapshot.name
            ),
        }
        Ok(())
    }
}

fn load_rgb(image: &FrameImage) -> Result<RgbImage, EvidenceError> {
    match image {
        FrameImage::File(path) => Ok(image::open(path)?.to_rgb8()),
        FrameImage::Decoded(frame) => {
            let expected = frame.width * frame.height * 3;
            if frame.data.len() < expected {
                return Err(EvidenceError::FrameBuffer {
                    expected,
                    actual: frame.data.len(),
                    width: frame.width,
                    height: frame.height,
                });
            }
            ImageBuffer::from_raw(
                frame.width as u32,
                frame.height as u32,
                frame.data[..expected].to_vec(),
            )
            .ok_or(EvidenceError::FrameBuffer {
                expected,
                actual: frame.data.len(),
                width: frame.width,
                height: frame.height,
            })
        }
    }
}

/// Labels embed configurable class names; keep them from leaving the directory.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "snapshot".to_string()
    } else {
        stem
    }
}

/// Crop `bbox`, clamped to the image, out of `frame`.
fn crop_rgb(frame: &RgbImage, bbox: BoundingBox) -> Result<RgbImage, EvidenceError> {
    let (width, height) = frame.dimensions();
    let clamped = bbox
        .clamp_to(width, height)
        .ok_or(EvidenceError::EmptyCrop {
            bbox,
            width,
            height,
        })?;
    Ok(image::imageops::crop_imm(
        frame,
        clamped.x1 as u32,
        clamped.y1 as u32,
        clamped.width() as u32,
        clamped.height() as u32,
    )
    .to_image())
}
