//! Event payloads for each topic.

use combat_core::{ActionOutcome, CombatantId, Controller, ReactionResolution, TriggeringAction};
use serde::{Deserialize, Serialize};

use crate::ai::DecisionPlan;
use crate::flow::{PhaseStep, TurnReport};

/// Turn progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A combatant received the initiative.
    Started {
        actor: CombatantId,
        round: u32,
        controller: Controller,
    },

    /// A plan was accepted for execution.
    Planned { plan: Box<DecisionPlan> },

    /// One phase record ran (phase-stepped mode).
    PhaseExecuted {
        actor: CombatantId,
        index: usize,
        step: PhaseStep,
        outcome: Option<Box<ActionOutcome>>,
    },

    Completed(Box<TurnReport>),

    /// A player-controlled combatant holds the initiative; the suggestion is
    /// what the AI would do in its place.
    AwaitingPlayer {
        actor: CombatantId,
        suggestion: Box<DecisionPlan>,
    },
}

/// Reaction windows that need or received player input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReactionEvent {
    Requested {
        reactors: Vec<CombatantId>,
        trigger: TriggeringAction,
    },

    Resolved(ReactionResolution),
}
