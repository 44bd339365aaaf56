// src/pipeline/mod.rs

pub mod engine;
pub mod event_bus;
pub mod frame_context;
pub mod metrics;

pub use engine::{FrameReport, ViolationEngine};
pub use event_bus::{EngineEvent, EventBus};
pub use frame_context::{FrameContext, FrameImage};
pub use metrics::{EngineMetrics, MetricsSummary};
