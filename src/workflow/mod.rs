pub mod engine;
pub mod types;

pub use engine::Orchestrator;
pub use types::{ChangeRequest, WorkflowOutcome};
