//! Asynchronous abstraction for player decisions.
//!
//! Hosts plug in [`PlayerController`] implementations so the runtime can run
//! with human input, scripted fixtures, or the AI standing in for a player.
use async_trait::async_trait;
use combat_core::{ActionKind, CombatView, CombatantId, TriggeringAction};

use super::errors::Result;
use crate::ai::DecisionPlan;

/// Decisions for player-controlled combatants.
#[async_trait]
pub trait PlayerController: Send + Sync {
    /// Plan for `actor`'s turn. `suggestion` is what the AI would do.
    async fn provide_plan(
        &self,
        view: &CombatView,
        actor: CombatantId,
        suggestion: DecisionPlan,
    ) -> Result<DecisionPlan>;

    /// Reaction for `reactor` against `trigger`, or `None` to decline.
    async fn provide_reaction(
        &self,
        view: &CombatView,
        reactor: CombatantId,
        trigger: &TriggeringAction,
    ) -> Result<Option<ActionKind>>;
}

/// Accepts every AI suggestion and declines every reaction.
pub struct AutopilotController;

#[async_trait]
impl PlayerController for AutopilotController {
    async fn provide_plan(
        &self,
        _view: &CombatView,
        _actor: CombatantId,
        suggestion: DecisionPlan,
    ) -> Result<DecisionPlan> {
        Ok(suggestion)
    }

    async fn provide_reaction(
        &self,
        _view: &CombatView,
        _reactor: CombatantId,
        _trigger: &TriggeringAction,
    ) -> Result<Option<ActionKind>> {
        Ok(None)
    }
}
