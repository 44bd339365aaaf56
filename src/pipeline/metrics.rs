// src/pipeline/metrics.rs
//
// Engine counters. Cheap to clone and share with a reporting thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub sampled_epochs: Arc<AtomicU64>,
    pub observations: Arc<AtomicU64>,
    pub skipped_observations: Arc<AtomicU64>,
    pub intersecting_tracks: Arc<AtomicU64>,
    pub stationary_tracks: Arc<AtomicU64>,
    pub violations: Arc<AtomicU64>,
    pub persistence_failures: Arc<AtomicU64>,
    pub history_resets: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            sampled_epochs: Arc::new(AtomicU64::new(0)),
            observations: Arc::new(AtomicU64::new(0)),
            skipped_observations: Arc::new(AtomicU64::new(0)),
            intersecting_tracks: Arc::new(AtomicU64::new(0)),
            stationary_tracks: Arc::new(AtomicU64::new(0)),
            violations: Arc::new(AtomicU64::new(0)),
            persistence_failures: Arc::new(AtomicU64::new(0)),
            history_resets: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Processing rate, frames per wall-clock second.
    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            sampled_epochs: self.sampled_epochs.load(Ordering::Relaxed),
            observations: self.observations.load(Ordering::Relaxed),
            skipped_observations: self.skipped_observations.load(Ordering::Relaxed),
            intersecting_tracks: self.intersecting_tracks.load(Ordering::Relaxed),
            stationary_tracks: self.stationary_tracks.load(Ordering::Relaxed),
            violations: self.violations.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            history_resets: self.history_resets.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub sampled_epochs: u64,
    pub observations: u64,
    pub skipped_observations: u64,
    pub intersecting_tracks: u64,
    pub stationary_tracks: u64,
    pub violations: u64,
    pub persistence_failures: u64,
    pub history_resets: u64,
    pub elapsed_secs: f64,
}
