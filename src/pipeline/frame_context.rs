// src/pipeline/frame_context.rs
//
// Everything the engine is handed for one frame: the tracker's output plus,
// optionally, the pixels the evidence snapshot is cropped from.

use crate::types::{Frame, TrackObservation};
use std::path::PathBuf;

/// Where the frame's pixels can be found, if anywhere.
#[derive(Debug, Clone)]
pub enum FrameImage {
    Decoded(Frame),
    /// Still image on disk, only decoded when a snapshot is actually needed.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_index: u64,
    pub observations: Vec<TrackObservation>,
    pub image: Option<FrameImage>,
}

impl FrameContext {
    /// Stamps `frame_index` onto every observation.
    pub fn new(frame_index: u64, observations: Vec<TrackObservation>) -> Self {
        let observations = observations
            .into_iter()
            .map(|mut o| {
                o.frame_index = frame_index;
                o
            })
            .collect();
        Self {
            frame_index,
            observations,
            image: None,
        }
    }

    pub fn with_image(mut self, image: FrameImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Video time of this frame in seconds.
    pub fn timestamp_s(&self, fps: f64) -> f64 {
        self.frame_index as f64 / fps
    }
}
