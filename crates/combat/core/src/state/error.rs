//! State machine misuse errors.
//!
//! These are returned when a caller asks the state machine to do something
//! its invariants forbid (advancing while a reaction window is open, queueing
//! into a closed window). Invalid *actions* are not errors; see
//! [`crate::action::ActionRejection`].

use crate::config::ConfigError;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{CombatantId, InsufficientResource};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("unknown combatant {id}")]
    UnknownCombatant { id: CombatantId },

    #[error("combatant {id} is already in the roster")]
    DuplicateCombatant { id: CombatantId },

    #[error("roster is full (max: {max})")]
    RosterFull { max: usize },

    #[error("combat has not started")]
    NotStarted,

    #[error("combat has already started")]
    AlreadyStarted,

    #[error("combat needs at least two factions")]
    NotEnoughFactions,

    #[error("a reaction window is open")]
    ReactionWindowOpen,

    #[error("no reaction window is open")]
    NoReactionWindow,

    #[error("the reaction window no longer accepts reactions")]
    ReactionWindowClosed,

    #[error("{reactor} is not eligible to react")]
    NotEligible { reactor: CombatantId },

    #[error("{reactor} already queued a reaction")]
    AlreadyQueued { reactor: CombatantId },

    #[error("reaction window is full (max: {max})")]
    WindowFull { max: usize },

    #[error("{kind} is not a reaction permitted against this trigger")]
    ReactionNotPermitted { kind: String },

    #[error("combat is over")]
    CombatOver,

    #[error(transparent)]
    InsufficientResource(#[from] InsufficientResource),

    #[error("no ship attached for combatant {id}")]
    ShipMissing { id: CombatantId },

    #[error("snapshot is inconsistent: {reason}")]
    InvalidSnapshot { reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CombatError for StateError {
    fn severity(&self) -> ErrorSeverity {
        use StateError::*;
        match self {
            WindowFull { .. } | CombatOver | StateError::InsufficientResource(_) => ErrorSeverity::Recoverable,

            UnknownCombatant { .. }
            | DuplicateCombatant { .. }
            | RosterFull { .. }
            | NotStarted
            | AlreadyStarted
            | NotEnoughFactions
            | ReactionWindowOpen
            | NoReactionWindow
            | ReactionWindowClosed
            | NotEligible { .. }
            | AlreadyQueued { .. }
            | ReactionNotPermitted { .. }
            | Config(_) => ErrorSeverity::Validation,

            ShipMissing { .. } | InvalidSnapshot { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use StateError::*;
        match self {
            UnknownCombatant { .. } => "STATE_UNKNOWN_COMBATANT",
            DuplicateCombatant { .. } => "STATE_DUPLICATE_COMBATANT",
            RosterFull { .. } => "STATE_ROSTER_FULL",
            NotStarted => "STATE_NOT_STARTED",
            AlreadyStarted => "STATE_ALREADY_STARTED",
            NotEnoughFactions => "STATE_NOT_ENOUGH_FACTIONS",
            ReactionWindowOpen => "STATE_WINDOW_OPEN",
            NoReactionWindow => "STATE_NO_WINDOW",
            ReactionWindowClosed => "STATE_WINDOW_CLOSED",
            NotEligible { .. } => "STATE_NOT_ELIGIBLE",
            AlreadyQueued { .. } => "STATE_ALREADY_QUEUED",
            WindowFull { .. } => "STATE_WINDOW_FULL",
            ReactionNotPermitted { .. } => "STATE_REACTION_NOT_PERMITTED",
            CombatOver => "STATE_COMBAT_OVER",
            StateError::InsufficientResource(_) => "STATE_INSUFFICIENT_RESOURCE",
            ShipMissing { .. } => "STATE_SHIP_MISSING",
            InvalidSnapshot { .. } => "STATE_INVALID_SNAPSHOT",
            Config(_) => "STATE_INVALID_CONFIG",
        }
    }
}
