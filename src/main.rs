// src/main.rs
//
// Batch driver: runs one violation engine per recorded observation stream
// and writes evidence under `output.dir/<stream name>/`.

use anyhow::{Context, Result};
use parking_violation::pipeline::{EngineEvent, MetricsSummary, ViolationEngine};
use parking_violation::source::{ObservationStream, SourceFinder};
use parking_violation::types::Config;
use parking_violation::FileEvidenceSink;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

struct SourceStats {
    frames: u64,
    skipped_lines: usize,
    violations: Vec<String>,
    alarms: Vec<String>,
    metrics: MetricsSummary,
    evidence_dir: PathBuf,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("parking_violation={}", config.logging.level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🅿️  Parking Violation Detection Starting");
    info!(
        "Zone: {} vertices | tolerance={}px | dwell threshold={:.1}s | margin={}px",
        config.zone.polygon.len(),
        config.detection.stationarity_tolerance,
        config.detection.dwell_threshold_seconds,
        config.detection.edge_margin
    );

    let streams = SourceFinder::new(config.input.clone()).find_streams()?;
    if streams.is_empty() {
        error!("No observation streams found in {}", config.input.dir);
        return Ok(());
    }

    for (idx, path) in streams.iter().enumerate() {
        info!("========================================");
        info!("Processing source {}/{}: {}", idx + 1, streams.len(), path.display());
        info!("========================================");

        match process_source(path, &config) {
            Ok(stats) => {
                info!("✓ Source processed");
                info!("  Frames: {}", stats.frames);
                info!("  Sampling epochs: {}", stats.metrics.sampled_epochs);
                info!("  Observations: {}", stats.metrics.observations);
                if stats.metrics.skipped_observations > 0 || stats.skipped_lines > 0 {
                    warn!(
                        "  Skipped: {} observation(s), {} malformed line(s)",
                        stats.metrics.skipped_observations, stats.skipped_lines
                    );
                }
                if stats.metrics.history_resets > 0 {
                    info!("  History resets: {}", stats.metrics.history_resets);
                }
                if stats.violations.is_empty() {
                    info!("  Violations: 0");
                } else {
                    warn!(
                        "  🚨 Violations: {} ({})",
                        stats.violations.len(),
                        stats.violations.join(", ")
                    );
                    for alarm in &stats.alarms {
                        info!("     {}", alarm);
                    }
                }
                if stats.metrics.persistence_failures > 0 {
                    error!(
                        "  Evidence write failures: {}",
                        stats.metrics.persistence_failures
                    );
                }
                info!("  Evidence: {}", stats.evidence_dir.display());
                info!("  Processing speed: {:.1} FPS", stats.metrics.fps);
                debug!("Metrics: {}", serde_json::to_string(&stats.metrics)?);
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(())
}

fn process_source(path: &Path, config: &Config) -> Result<SourceStats> {
    let mut stream = ObservationStream::open(path)?;
    let header = stream.header();

    // one engine per source: track ids are only unique within one tracker
    let mut engine = ViolationEngine::new(config, header.width, header.height, header.fps)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    let evidence_dir = PathBuf::from(&config.output.dir).join(stem);
    let mut sink = FileEvidenceSink::create(
        &evidence_dir,
        config.output.save_snapshots,
        config.output.snapshot_quality,
    )?;

    let mut frames = 0u64;
    while let Some(ctx) = stream.next_frame()? {
        engine.process_frame(&ctx, &mut sink);
        frames += 1;
        report_events(engine.drain_events());
    }

    Ok(SourceStats {
        frames,
        skipped_lines: stream.skipped_lines(),
        violations: engine.violations().iter().map(|r| r.label.clone()).collect(),
        alarms: engine.alarm_labels(),
        metrics: engine.metrics().summary(),
        evidence_dir,
    })
}

fn report_events(events: Vec<EngineEvent>) {
    for event in events {
        match event {
            EngineEvent::DwellStarted { key, start_time_s } => debug!(
                "Track {}:{} at rest in zone since {:.2}s",
                key.class_id, key.track_id, start_time_s
            ),
            EngineEvent::DwellAbandoned { key, dwell_seconds } => debug!(
                "Track {}:{} left or moved after {:.2}s",
                key.class_id, key.track_id, dwell_seconds
            ),
            EngineEvent::ViolationConfirmed(record) => warn!(
                "🚨 {} parked illegally for {:.2}s (since {:.2}s, frame {})",
                record.label, record.dwell_seconds, record.start_time_s, record.frame_index
            ),
            EngineEvent::HistoryReset { epoch, dropped } => {
                debug!("History reset at epoch {} ({} samples)", epoch, dropped)
            }
            EngineEvent::ObservationSkipped { frame_index, reason } => {
                debug!("Frame {}: {}", frame_index, reason)
            }
            EngineEvent::PersistenceFailed { label } => {
                warn!("Evidence for {} was not saved", label)
            }
        }
    }
}
