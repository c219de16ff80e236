//! Reaction window records.

use crate::action::{ActionKind, ActionOutcome};
use crate::ship::AttackRoll;
use crate::state::CombatantId;

/// The action that opened a reaction window.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggeringAction {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub target: Option<CombatantId>,
    pub weapon: Option<usize>,
    /// Incoming munition is guided (point defense can intercept it).
    pub guided: bool,
    /// Pre-reaction to-hit result, if the trigger was an attack.
    pub attack: Option<AttackRoll>,
}

/// A reaction queued by an eligible reactor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionQueueEntry {
    pub reactor: CombatantId,
    pub kind: ActionKind,
    pub trigger: TriggeringAction,
}

/// Open interrupt window. Exists from `open_reaction_window` until
/// `resolve_reactions`; no normal phase advances while it exists.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionWindow {
    pub trigger: TriggeringAction,
    pub eligible: Vec<CombatantId>,
    pub queue: Vec<ReactionQueueEntry>,
    pub opened_round: u32,
    /// Closed windows accept no more reactions but still await resolution.
    pub accepting: bool,
}

impl ReactionWindow {
    pub fn is_eligible(&self, reactor: CombatantId) -> bool {
        self.eligible.contains(&reactor)
    }

    pub fn has_queued(&self, reactor: CombatantId) -> bool {
        self.queue.iter().any(|e| e.reactor == reactor)
    }
}

/// One executed reaction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionReport {
    pub reactor: CombatantId,
    pub kind: ActionKind,
    pub outcome: ActionOutcome,
}

/// Result of resolving a window.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionResolution {
    pub trigger: TriggeringAction,
    pub reports: Vec<ReactionReport>,
    /// A defensive reaction fully negated the incoming attack.
    pub intercepted: bool,
}

impl ReactionResolution {
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
