//! Turn execution on top of the AI planner.
//!
//! [`TurnFlowOrchestrator`] owns its collaborators from construction: the
//! decision engine plus the reaction deciders for AI and player reactors.
//! Both execution modes drive the same [`SteppedTurn`]; run-to-completion just
//! keeps stepping and never pauses for players.

use std::sync::Arc;

use combat_core::{CombatStateMachine, CombatantId, StateError};
use tracing::info;

use super::error::FlowError;
use super::report::TurnReport;
use super::stepped::{PlayerReactions, StepResult, SteppedTurn};
use crate::ai::{AiDecisionEngine, AiReactionPolicy, DecisionPlan, DeclineReactions, ReactionDecider};

pub struct TurnFlowOrchestrator {
    engine: AiDecisionEngine,
    reactions: Arc<dyn ReactionDecider>,
    player_reactions: Arc<dyn ReactionDecider>,
}

impl TurnFlowOrchestrator {
    /// AI reactors follow [`AiReactionPolicy`]; players decline unless a
    /// decider is installed with [`Self::with_player_reactions`].
    pub fn new(engine: AiDecisionEngine) -> Self {
        let reactions = Arc::new(AiReactionPolicy::new(engine.profiles().clone()));
        Self {
            engine,
            reactions,
            player_reactions: Arc::new(DeclineReactions),
        }
    }

    pub fn with_reactions(mut self, reactions: Arc<dyn ReactionDecider>) -> Self {
        self.reactions = reactions;
        self
    }

    pub fn with_player_reactions(mut self, reactions: Arc<dyn ReactionDecider>) -> Self {
        self.player_reactions = reactions;
        self
    }

    pub fn engine(&self) -> &AiDecisionEngine {
        &self.engine
    }

    pub fn plan(&self, machine: &CombatStateMachine, actor: CombatantId) -> DecisionPlan {
        self.engine.plan_turn(machine, actor)
    }

    /// Plans and runs the current combatant's whole turn.
    pub fn run_turn(&self, machine: &mut CombatStateMachine) -> Result<TurnReport, FlowError> {
        if machine.is_over() {
            return Err(StateError::CombatOver.into());
        }
        let actor = machine.current().ok_or(StateError::NotStarted)?;
        let plan = self.plan(machine, actor);
        self.run_plan(machine, plan)
    }

    /// Runs `plan` to completion: movement, each action with its reaction
    /// window resolved before damage, bonus actions, final movement.
    pub fn run_plan(
        &self,
        machine: &mut CombatStateMachine,
        plan: DecisionPlan,
    ) -> Result<TurnReport, FlowError> {
        machine.annotate(plan.summary());
        let mut turn = SteppedTurn::new(plan);
        loop {
            match self.step(&mut turn, machine, false)? {
                StepResult::Completed(report) => {
                    info!(
                        actor = %report.actor,
                        round = report.round,
                        hits = report.hits(),
                        damage = report.damage_dealt(),
                        "turn resolved"
                    );
                    return Ok(report);
                }
                StepResult::Executed { .. } => {}
                StepResult::AwaitingReaction { .. } => return Err(FlowError::AwaitingReaction),
            }
        }
    }

    /// Starts a phase-stepped turn for `plan`.
    pub fn begin_stepped(&self, machine: &mut CombatStateMachine, plan: DecisionPlan) -> SteppedTurn {
        machine.annotate(plan.summary());
        SteppedTurn::new(plan)
    }

    /// Executes one record of `turn`. With `pause_for_players` an attack on a
    /// player-controlled ship suspends the turn instead of consulting the
    /// player reaction decider.
    pub fn step(
        &self,
        turn: &mut SteppedTurn,
        machine: &mut CombatStateMachine,
        pause_for_players: bool,
    ) -> Result<StepResult, FlowError> {
        let players = if pause_for_players {
            PlayerReactions::Pause
        } else {
            PlayerReactions::Decide(self.player_reactions.as_ref())
        };
        turn.step(machine, self.reactions.as_ref(), players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use crate::ai::{PlannedAction, Strategy};
    use crate::config::{AiConfig, ProfileCatalog};
    use combat_core::{ActionKind, Controller};

    fn orchestrator() -> TurnFlowOrchestrator {
        TurnFlowOrchestrator::new(AiDecisionEngine::new(
            AiConfig::default(),
            ProfileCatalog::default(),
        ))
    }

    #[test]
    fn ai_turn_runs_to_completion() {
        let mut machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let report = orchestrator().run_turn(&mut machine).unwrap();

        assert_eq!(report.actor, CombatantId(1));
        assert_eq!(report.next, Some(CombatantId(2)));
        assert_eq!(machine.current(), Some(CombatantId(2)));
        assert!(machine.reaction_window().is_none());
        assert!(machine
            .log()
            .entries()
            .any(|e| e.message == report.plan.summary()));
    }

    #[test]
    fn player_targets_decline_by_default() {
        let mut pirate = scripted(2, "Pirates", &[], &[]);
        pirate.controller = Controller::Player;
        let mut machine = begin(vec![scripted(1, "Navy", &[18], &[10]), pirate]);

        let mut plan = DecisionPlan::new(CombatantId(1), 1, Strategy::Attack);
        plan.actions.push(PlannedAction::fire(CombatantId(2), 0));
        let report = orchestrator().run_plan(&mut machine, plan).unwrap();

        assert_eq!(report.attacks.len(), 1);
        assert!(report.attacks[0].hit());
        assert!(report.reactions.is_empty());
        let shields = machine.combatant(CombatantId(2)).unwrap().ship.current_shields();
        assert_eq!(shields, 30);
    }

    #[test]
    fn ai_target_reacts_to_guided_fire() {
        let mut machine = begin(vec![
            scripted(1, "Navy", &[18], &[20]),
            scripted(2, "Pirates", &[], &[]),
        ]);
        let mut plan = DecisionPlan::new(CombatantId(1), 1, Strategy::Attack);
        plan.movement = Some(PlannedAction::at(ActionKind::MoveCloser, CombatantId(2)));
        plan.actions.push(PlannedAction::fire(CombatantId(2), 1));
        let report = orchestrator().run_plan(&mut machine, plan).unwrap();

        assert_eq!(report.reactions.len(), 1);
        assert_eq!(report.reactions[0].reports[0].kind, ActionKind::PointDefense);
        assert!(report.attacks[0].intercepted);
        assert_eq!(report.damage_dealt(), 0);
    }

    #[test]
    fn finished_combat_refuses_turns() {
        let mut machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        machine.record_surrender(CombatantId(2)).unwrap();
        assert!(matches!(
            orchestrator().run_turn(&mut machine),
            Err(FlowError::State(StateError::CombatOver))
        ));
    }

    #[test]
    fn repeated_turns_alternate_initiative() {
        let mut machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let orchestrator = orchestrator();
        let mut actors = Vec::new();
        for _ in 0..6 {
            if machine.is_over() {
                break;
            }
            actors.push(orchestrator.run_turn(&mut machine).unwrap().actor);
        }
        assert_eq!(actors[..2], [CombatantId(1), CombatantId(2)]);
        assert!(machine.round() >= 2);
    }
}
