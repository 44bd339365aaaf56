// End-to-end scenarios against the public engine API.

use parking_violation::error::EvidenceError;
use parking_violation::evidence::RECORD_LOG_NAME;
use parking_violation::source::ObservationStream;
use parking_violation::{
    BoundingBox, Config, EvidenceSink, FileEvidenceSink, FrameContext, FrameImage, Point2D,
    SnapshotRequest, TrackObservation, ViolationEngine, ViolationRecord,
};
use std::fs;

#[derive(Default)]
struct CollectingSink {
    records: Vec<ViolationRecord>,
}

impl EvidenceSink for CollectingSink {
    fn persist(
        &mut self,
        record: &ViolationRecord,
        _snapshot: &SnapshotRequest,
        _image: Option<&FrameImage>,
    ) -> Result<(), EvidenceError> {
        self.records.push(record.clone());
        Ok(())
    }
}

fn unit_square_config() -> Config {
    let mut config = Config::default();
    config.zone.polygon = vec![
        Point2D::new(0, 0),
        Point2D::new(10, 0),
        Point2D::new(10, 10),
        Point2D::new(0, 10),
    ];
    config.detection.stationarity_tolerance = 50;
    config.detection.dwell_threshold_seconds = 5.0;
    config
}

fn track(track_id: u64, bbox: BoundingBox) -> TrackObservation {
    TrackObservation {
        track_id,
        class_id: 2,
        bbox,
        frame_index: 0,
    }
}

#[test]
fn parked_for_six_epochs_confirms_at_sixth() {
    let mut engine = ViolationEngine::new(&unit_square_config(), 64, 64, 1.0).unwrap();
    let mut sink = CollectingSink::default();
    let parked = BoundingBox::new(2, 2, 8, 8);

    let mut confirmed_at = Vec::new();
    for frame in 0..6 {
        let ctx = FrameContext::new(frame, vec![track(1, parked)]);
        let report = engine.process_frame(&ctx, &mut sink);
        if !report.violations.is_empty() {
            confirmed_at.push(frame);
        }
    }

    assert_eq!(confirmed_at, vec![5]);
    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.records[0].track_id, 1);
    assert!(sink.records[0].dwell_seconds >= 5.0);

    // idempotent: staying parked produces nothing further
    for frame in 6..30 {
        let ctx = FrameContext::new(frame, vec![track(1, parked)]);
        let report = engine.process_frame(&ctx, &mut sink);
        assert!(report.violations.is_empty());
    }
    assert_eq!(sink.records.len(), 1);
}

#[test]
fn moving_sixty_pixels_mid_dwell_never_confirms() {
    let mut engine = ViolationEngine::new(&unit_square_config(), 64, 64, 1.0).unwrap();
    let mut sink = CollectingSink::default();
    let before = BoundingBox::new(2, 2, 8, 8);
    // 30px right: L1 distance 60 from `before`
    let after = BoundingBox::new(32, 2, 38, 8);
    assert_eq!(before.l1_distance(&after), 60);

    for frame in 0..12 {
        let bbox = if frame < 3 { before } else { after };
        engine.process_frame(&FrameContext::new(frame, vec![track(1, bbox)]), &mut sink);
    }
    assert!(sink.records.is_empty());
    assert_eq!(engine.active_timers(), 0);
}

#[test]
fn jitter_within_tolerance_still_confirms() {
    let mut engine = ViolationEngine::new(&unit_square_config(), 64, 64, 1.0).unwrap();
    let mut sink = CollectingSink::default();
    let jitter = [
        BoundingBox::new(2, 2, 8, 8),
        BoundingBox::new(3, 1, 9, 8),
        BoundingBox::new(1, 2, 8, 9),
        BoundingBox::new(2, 3, 7, 8),
        BoundingBox::new(2, 2, 8, 8),
        BoundingBox::new(4, 2, 9, 8),
    ];
    for (frame, bbox) in jitter.iter().enumerate() {
        let ctx = FrameContext::new(frame as u64, vec![track(5, *bbox)]);
        engine.process_frame(&ctx, &mut sink);
    }
    assert_eq!(sink.records.len(), 1);
}

#[test]
fn history_resets_do_not_restart_dwell_timers() {
    let mut config = unit_square_config();
    config.detection.history_capacity = 5;
    let mut engine = ViolationEngine::new(&config, 64, 64, 1.0).unwrap();
    let mut sink = CollectingSink::default();
    let parked = BoundingBox::new(2, 2, 8, 8);

    for frame in 0..6 {
        let observations = (1..=3).map(|id| track(id, parked)).collect();
        engine.process_frame(&FrameContext::new(frame, observations), &mut sink);
    }

    // three tracks, capacity five: store is cleared before epochs 2 and 4,
    // yet each timer keeps its epoch-0 start and confirms at epoch 5
    assert_eq!(sink.records.len(), 3);
    assert!(sink.records.iter().all(|r| r.start_time_s == 0.0 && r.frame_index == 5));
    assert_eq!(engine.metrics().summary().history_resets, 2);
}

#[test]
fn independent_sources_do_not_share_tracks() {
    let config = unit_square_config();
    let mut north = ViolationEngine::new(&config, 64, 64, 1.0).unwrap();
    let mut south = ViolationEngine::new(&config, 64, 64, 1.0).unwrap();
    let mut sink = CollectingSink::default();
    let parked = BoundingBox::new(2, 2, 8, 8);
    let elsewhere = BoundingBox::new(40, 40, 50, 50);

    // same (class, track) pair on both cameras; only the north one is parked
    for frame in 0..8 {
        north.process_frame(&FrameContext::new(frame, vec![track(1, parked)]), &mut sink);
        south.process_frame(&FrameContext::new(frame, vec![track(1, elsewhere)]), &mut sink);
    }
    assert_eq!(north.violations().len(), 1);
    assert!(south.violations().is_empty());
}

#[test]
fn recorded_stream_to_evidence_directory() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::from_pixel(64, 48, image::Rgb([90, 120, 200]))
        .save(dir.path().join("frame.png"))
        .unwrap();

    let mut body = String::from("{\"fps\": 1.0, \"width\": 64, \"height\": 48}\n");
    for frame in 0..8 {
        body.push_str(&format!(
            "{{\"frame_index\": {}, \"image\": \"frame.png\", \"observations\": [{{\"track_id\": 1, \"class_id\": 2, \"bbox\": [15, 15, 45, 35]}}]}}\n",
            frame
        ));
    }
    let stream_path = dir.path().join("cam.jsonl");
    fs::write(&stream_path, body).unwrap();

    let mut config = Config::default();
    config.zone.polygon = vec![
        Point2D::new(10, 10),
        Point2D::new(50, 10),
        Point2D::new(50, 40),
        Point2D::new(10, 40),
    ];

    let mut stream = ObservationStream::open(&stream_path).unwrap();
    let header = stream.header();
    let mut engine =
        ViolationEngine::new(&config, header.width, header.height, header.fps).unwrap();
    let evidence_dir = dir.path().join("out");
    let mut sink = FileEvidenceSink::create(&evidence_dir, true, 85).unwrap();

    while let Some(ctx) = stream.next_frame().unwrap() {
        engine.process_frame(&ctx, &mut sink);
    }

    let log = fs::read_to_string(evidence_dir.join(RECORD_LOG_NAME)).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("\"label\":\"car1\""));

    let snapshot = image::open(evidence_dir.join("car1.jpg")).unwrap();
    assert_eq!((snapshot.width(), snapshot.height()), (30, 20));
}
