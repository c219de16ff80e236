//! Turn execution: run-to-completion and phase-stepped.
mod error;
mod orchestrator;
mod report;
mod stepped;

pub use error::FlowError;
pub use orchestrator::TurnFlowOrchestrator;
pub use report::TurnReport;
pub use stepped::{PhaseRecord, PhaseStep, PlayerReactions, StepResult, SteppedTurn, phase_records};
