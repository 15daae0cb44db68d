pub mod aggregator;
pub mod orchestrator;

pub use aggregator::ResultAggregator;
pub use orchestrator::{IntakeOrchestrator, PipelinePolicy};
