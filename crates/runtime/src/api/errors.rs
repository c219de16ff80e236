//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, configuration loading, and the
//! turn flow so clients can bubble them up with consistent context.
use combat_core::{CombatError, CombatantId, ErrorSeverity, StateError};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::flow::FlowError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    #[error("invalid scenario: {reason}")]
    InvalidScenario { reason: String },

    #[error("plan for {provided} submitted during {expected}'s turn")]
    InvalidPlanActor {
        expected: CombatantId,
        provided: CombatantId,
    },

    #[error("no combatant is waiting for a player decision")]
    NotAwaitingPlayer,

    #[error("no reaction window is waiting on {reactor}")]
    NotAwaitingReaction { reactor: CombatantId },

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CombatError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::State(err) => err.severity(),
            RuntimeError::Flow(err) => err.severity(),
            RuntimeError::InvalidPlanActor { .. }
            | RuntimeError::NotAwaitingPlayer
            | RuntimeError::NotAwaitingReaction { .. }
            | RuntimeError::InvalidConfig { .. }
            | RuntimeError::InvalidScenario { .. }
            | RuntimeError::Json(_) => ErrorSeverity::Validation,
            RuntimeError::Io { .. } => ErrorSeverity::Recoverable,
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            RuntimeError::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            RuntimeError::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            RuntimeError::Io { .. } => "RUNTIME_IO",
            RuntimeError::InvalidConfig { .. } => "RUNTIME_INVALID_CONFIG",
            RuntimeError::InvalidScenario { .. } => "RUNTIME_INVALID_SCENARIO",
            RuntimeError::InvalidPlanActor { .. } => "RUNTIME_INVALID_PLAN_ACTOR",
            RuntimeError::NotAwaitingPlayer => "RUNTIME_NOT_AWAITING_PLAYER",
            RuntimeError::NotAwaitingReaction { .. } => "RUNTIME_NOT_AWAITING_REACTION",
            RuntimeError::State(err) => err.error_code(),
            RuntimeError::Flow(err) => err.error_code(),
            RuntimeError::Json(_) => "RUNTIME_JSON",
        }
    }
}
