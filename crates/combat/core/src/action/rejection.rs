//! Reasons an action was refused before its effect ran.

use crate::action::ActionKind;
use crate::error::{CombatError, ErrorSeverity};
use crate::positioning::DistanceBand;
use crate::state::{CombatantId, CooldownBlocked, InsufficientResource};

/// Why an action request was refused.
///
/// Rejections are reported inside an unsuccessful
/// [`ActionOutcome`](crate::action::ActionOutcome); turn processing goes on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionRejection {
    #[error("unknown combatant {id}")]
    UnknownCombatant { id: CombatantId },

    #[error("{id} is out of the fight")]
    Inactive { id: CombatantId },

    #[error("{action} is not in the action catalogue")]
    UnknownAction { action: ActionKind },

    #[error("{action} requires a target")]
    MissingTarget { action: ActionKind },

    #[error("{target} is not a valid target for {action}")]
    InvalidTarget {
        action: ActionKind,
        target: CombatantId,
    },

    #[error("ship has no {capability} for {action}")]
    MissingCapability {
        action: ActionKind,
        capability: String,
    },

    #[error("ship has no weapons")]
    NoWeapon,

    #[error("no weapon at index {index}")]
    UnknownWeapon { index: usize },

    #[error("{weapon} cannot fire at {band} range")]
    WeaponOutOfBand { weapon: String, band: DistanceBand },

    #[error("{action}: {reason}")]
    InsufficientBudget { action: ActionKind, reason: String },

    #[error("{action} is on cooldown for {rounds_remaining} more round(s)")]
    OnCooldown {
        action: ActionKind,
        rounds_remaining: u32,
    },

    #[error("{action} has no uses left this combat")]
    UsesExhausted { action: ActionKind },

    #[error("{action} is a reaction and needs an open reaction window")]
    ReactionOutsideWindow { action: ActionKind },

    #[error("{action} cannot be taken while a reaction window is open")]
    WindowOpen { action: ActionKind },

    #[error("{action} is only available on the acting combatant's turn")]
    NotYourTurn { action: ActionKind },

    #[error("cannot move {action} any further")]
    MovementBlocked { action: ActionKind },

    #[error("combat is over")]
    CombatOver,
}

impl ActionRejection {
    pub(crate) fn from_budget(action: ActionKind, err: InsufficientResource) -> Self {
        Self::InsufficientBudget {
            action,
            reason: err.to_string(),
        }
    }

    pub(crate) fn from_cooldown(action: ActionKind, blocked: CooldownBlocked) -> Self {
        match blocked {
            CooldownBlocked::OnCooldown { rounds_remaining } => Self::OnCooldown {
                action,
                rounds_remaining,
            },
            CooldownBlocked::Exhausted => Self::UsesExhausted { action },
        }
    }
}

impl CombatError for ActionRejection {
    fn severity(&self) -> ErrorSeverity {
        use ActionRejection::*;
        match self {
            InsufficientBudget { .. }
            | OnCooldown { .. }
            | UsesExhausted { .. }
            | MovementBlocked { .. }
            | WeaponOutOfBand { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionRejection::*;
        match self {
            UnknownCombatant { .. } => "ACTION_UNKNOWN_COMBATANT",
            Inactive { .. } => "ACTION_INACTIVE",
            UnknownAction { .. } => "ACTION_UNKNOWN",
            MissingTarget { .. } => "ACTION_MISSING_TARGET",
            InvalidTarget { .. } => "ACTION_INVALID_TARGET",
            MissingCapability { .. } => "ACTION_MISSING_CAPABILITY",
            NoWeapon => "ACTION_NO_WEAPON",
            UnknownWeapon { .. } => "ACTION_UNKNOWN_WEAPON",
            WeaponOutOfBand { .. } => "ACTION_OUT_OF_BAND",
            InsufficientBudget { .. } => "ACTION_NO_BUDGET",
            OnCooldown { .. } => "ACTION_ON_COOLDOWN",
            UsesExhausted { .. } => "ACTION_USES_EXHAUSTED",
            ReactionOutsideWindow { .. } => "ACTION_REACTION_OUTSIDE_WINDOW",
            WindowOpen { .. } => "ACTION_WINDOW_OPEN",
            NotYourTurn { .. } => "ACTION_NOT_YOUR_TURN",
            MovementBlocked { .. } => "ACTION_MOVEMENT_BLOCKED",
            CombatOver => "ACTION_COMBAT_OVER",
        }
    }
}
