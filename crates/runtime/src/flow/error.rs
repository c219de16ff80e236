//! Errors raised while executing a turn plan.
use combat_core::{CombatError, CombatantId, ErrorSeverity, StateError, TurnPhase};
use thiserror::Error;

use super::stepped::PhaseStep;

#[derive(Debug, Error)]
pub enum FlowError {
    /// The state machine is not in the phase the next record expects.
    #[error("step {index} ({step}) expects phase {expected} but combat is in {actual}")]
    PhaseMismatch {
        index: usize,
        step: PhaseStep,
        expected: TurnPhase,
        actual: TurnPhase,
    },

    #[error("turn of {expected} cannot run while {actual:?} holds the initiative")]
    WrongActor {
        expected: CombatantId,
        actual: Option<CombatantId>,
    },

    #[error("stepped turn was poisoned by an earlier order violation")]
    Poisoned,

    #[error("turn is paused on a reaction window")]
    AwaitingReaction,

    #[error("turn is not paused on a reaction window")]
    NotAwaitingReaction,

    #[error("{reactor} is not being asked to react")]
    NotAwaitedReactor { reactor: CombatantId },

    #[error("turn already completed")]
    Finished,

    #[error(transparent)]
    State(#[from] StateError),
}

impl CombatError for FlowError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            FlowError::PhaseMismatch { .. } | FlowError::WrongActor { .. } | FlowError::Poisoned => {
                ErrorSeverity::Fatal
            }
            FlowError::AwaitingReaction
            | FlowError::NotAwaitingReaction
            | FlowError::NotAwaitedReactor { .. }
            | FlowError::Finished => ErrorSeverity::Validation,
            FlowError::State(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            FlowError::PhaseMismatch { .. } => "FLOW_PHASE_MISMATCH",
            FlowError::WrongActor { .. } => "FLOW_WRONG_ACTOR",
            FlowError::Poisoned => "FLOW_POISONED",
            FlowError::AwaitingReaction => "FLOW_AWAITING_REACTION",
            FlowError::NotAwaitingReaction => "FLOW_NOT_AWAITING_REACTION",
            FlowError::NotAwaitedReactor { .. } => "FLOW_NOT_AWAITED_REACTOR",
            FlowError::Finished => "FLOW_FINISHED",
            FlowError::State(err) => err.error_code(),
        }
    }
}
