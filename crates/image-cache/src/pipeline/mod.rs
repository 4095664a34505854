//! The get-or-save pipeline

pub mod orchestrator;
pub mod stage;

pub use orchestrator::Orchestrator;
pub use stage::PipelineStage;
