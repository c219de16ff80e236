//! Phase-stepped execution of a [`DecisionPlan`].
//!
//! A plan becomes an ordered list of [`PhaseRecord`]s
//! (`MOVEMENT, ACTION*, BONUS_ACTION*, FINAL_MOVEMENT`). Each call to
//! [`SteppedTurn::step`] executes exactly one record after checking that the
//! state machine sits in the phase the record expects; a mismatch poisons the
//! turn.
//!
//! An attack opens a reaction window. AI reactors answer immediately through
//! the [`ReactionDecider`]; player reactors either answer through a decider as
//! well or, when the caller asks to pause, suspend the turn. The suspended
//! attack keeps everything needed to finish it, so [`SteppedTurn::respond`]
//! followed by [`SteppedTurn::resume_after_reaction`] continues from the next
//! record without replaying anything.

use combat_core::{
    ActionOutcome, CombatStateMachine, CombatantId, Controller, PendingAttack, TriggeringAction,
    TurnPhase,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::error::FlowError;
use super::report::TurnReport;
use crate::ai::{DecisionPlan, PlannedAction, ReactionDecider, Strategy};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStep {
    Movement,
    Action,
    BonusAction,
    FinalMovement,
}

impl PhaseStep {
    /// State machine phase this step runs in. Final movement happens once the
    /// turn has reached END_TURN.
    pub const fn expected_phase(self) -> TurnPhase {
        match self {
            Self::Movement => TurnPhase::Movement,
            Self::Action => TurnPhase::Action,
            Self::BonusAction => TurnPhase::BonusAction,
            Self::FinalMovement => TurnPhase::EndTurn,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub step: PhaseStep,
    pub action: Option<PlannedAction>,
}

/// Expands a plan into its phase records. Movement and final movement are
/// always present, possibly empty.
pub fn phase_records(plan: &DecisionPlan) -> Vec<PhaseRecord> {
    let mut records = Vec::with_capacity(2 + plan.actions.len() + plan.bonus_actions.len());
    records.push(PhaseRecord {
        step: PhaseStep::Movement,
        action: plan.movement.clone(),
    });
    records.extend(plan.actions.iter().map(|a| PhaseRecord {
        step: PhaseStep::Action,
        action: Some(a.clone()),
    }));
    records.extend(plan.bonus_actions.iter().map(|a| PhaseRecord {
        step: PhaseStep::BonusAction,
        action: Some(a.clone()),
    }));
    records.push(PhaseRecord {
        step: PhaseStep::FinalMovement,
        action: plan.final_movement.clone(),
    });
    records
}

/// How reactions of player-controlled combatants are obtained.
#[derive(Clone, Copy)]
pub enum PlayerReactions<'a> {
    /// Suspend the turn until the host answers.
    Pause,
    Decide(&'a dyn ReactionDecider),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepResult {
    Executed {
        index: usize,
        step: PhaseStep,
        outcome: Option<ActionOutcome>,
    },
    /// An attack is waiting on player reactors.
    AwaitingReaction {
        reactors: Vec<CombatantId>,
        trigger: TriggeringAction,
    },
    Completed(TurnReport),
}

impl StepResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepResult::Completed(_))
    }
}

/// Pending damage context held across a reaction pause.
#[derive(Debug)]
struct SuspendedAttack {
    index: usize,
    pending: PendingAttack,
    outcome: ActionOutcome,
    awaiting: Vec<CombatantId>,
}

#[derive(Debug)]
pub struct SteppedTurn {
    records: Vec<PhaseRecord>,
    cursor: usize,
    suspended: Option<SuspendedAttack>,
    report: TurnReport,
    poisoned: bool,
    finished: bool,
}

impl SteppedTurn {
    pub fn new(plan: DecisionPlan) -> Self {
        Self {
            records: phase_records(&plan),
            cursor: 0,
            suspended: None,
            report: TurnReport::new(plan),
            poisoned: false,
            finished: false,
        }
    }

    pub fn actor(&self) -> CombatantId {
        self.report.actor
    }

    pub fn plan(&self) -> &DecisionPlan {
        &self.report.plan
    }

    pub fn records(&self) -> &[PhaseRecord] {
        &self.records
    }

    /// Index of the next record to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reactors the suspended attack is still waiting on.
    pub fn awaiting(&self) -> &[CombatantId] {
        match &self.suspended {
            Some(suspended) => &suspended.awaiting,
            None => &[],
        }
    }

    /// Trigger of the suspended attack.
    pub fn pending_trigger(&self) -> Option<TriggeringAction> {
        self.suspended.as_ref().map(|s| s.pending.trigger())
    }

    /// Executes the next phase record.
    pub fn step(
        &mut self,
        machine: &mut CombatStateMachine,
        reactions: &dyn ReactionDecider,
        players: PlayerReactions<'_>,
    ) -> Result<StepResult, FlowError> {
        if self.poisoned {
            return Err(FlowError::Poisoned);
        }
        if self.finished {
            return Err(FlowError::Finished);
        }
        if self.suspended.is_some() {
            return Err(FlowError::AwaitingReaction);
        }
        if machine.is_over() {
            return Ok(self.complete(machine));
        }

        let actor = self.actor();
        if machine.current() != Some(actor) {
            self.poisoned = true;
            error!(%actor, current = ?machine.current(), "stepped turn driven out of turn");
            return Err(FlowError::WrongActor {
                expected: actor,
                actual: machine.current(),
            });
        }

        let index = self.cursor;
        let Some(record) = self.records.get(index).cloned() else {
            return Err(FlowError::Finished);
        };
        let expected = record.step.expected_phase();
        if machine.phase() != expected {
            return Err(self.mismatch(index, record.step, machine.phase()));
        }

        if record.step == PhaseStep::Movement && self.apply_agreement(machine)? {
            if machine.is_over() {
                return Ok(self.complete(machine));
            }
            if !machine.is_active(actor) {
                machine.advance_turn()?;
                return Ok(self.complete(machine));
            }
        }

        let outcome = record
            .action
            .as_ref()
            .map(|action| machine.execute_action(action.request(actor)));
        if let Some(outcome) = &outcome {
            self.report.outcomes.push(outcome.clone());
        }
        debug!(%actor, index, step = %record.step, "phase record executed");

        if record.step == PhaseStep::Action
            && let Some(attack) = &outcome
            && let Some(pending) = attack.pending_attack.clone()
        {
            let attack = attack.clone();
            return self.open_window(machine, index, pending, attack, reactions, players);
        }

        self.after_record(machine, index, record.step, outcome)
    }

    /// Answers for one awaited player reactor. `None` declines.
    pub fn respond(
        &mut self,
        machine: &mut CombatStateMachine,
        reactor: CombatantId,
        reaction: Option<combat_core::ActionKind>,
    ) -> Result<(), FlowError> {
        let suspended = self.suspended.as_mut().ok_or(FlowError::NotAwaitingReaction)?;
        let Some(position) = suspended.awaiting.iter().position(|id| *id == reactor) else {
            return Err(FlowError::NotAwaitedReactor { reactor });
        };
        if let Some(kind) = reaction {
            machine.queue_reaction(reactor, kind)?;
        }
        suspended.awaiting.remove(position);
        Ok(())
    }

    /// Closes the window and finishes the suspended attack. Reactors that
    /// never answered are treated as declining.
    pub fn resume_after_reaction(
        &mut self,
        machine: &mut CombatStateMachine,
    ) -> Result<StepResult, FlowError> {
        let suspended = self.suspended.take().ok_or(FlowError::NotAwaitingReaction)?;
        if !suspended.awaiting.is_empty() {
            debug!(declined = ?suspended.awaiting, "unanswered reactors decline");
        }
        self.finish_attack(machine, suspended.index, suspended.pending, suspended.outcome)
    }

    fn mismatch(&mut self, index: usize, step: PhaseStep, actual: TurnPhase) -> FlowError {
        self.poisoned = true;
        let expected = step.expected_phase();
        error!(actor = %self.actor(), index, %step, %expected, %actual, "phase order violated");
        FlowError::PhaseMismatch {
            index,
            step,
            expected,
            actual,
        }
    }

    /// Applies an accepted negotiation. Returns whether one was applied.
    fn apply_agreement(&mut self, machine: &mut CombatStateMachine) -> Result<bool, FlowError> {
        let Some(agreement) = self.report.plan.agreement.clone() else {
            return Ok(false);
        };
        if self.report.agreement_applied {
            return Ok(false);
        }
        let actor = self.actor();
        match agreement.kind {
            Strategy::Surrender => machine.record_surrender(actor)?,
            Strategy::RequestSurrender => match agreement.counterpart {
                Some(counterpart) if machine.is_active(counterpart) => {
                    machine.record_surrender(counterpart)?
                }
                _ => return Ok(false),
            },
            Strategy::Truce => {
                let faction = |id| machine.combatant(id).map(|c| c.faction.clone());
                let (Some(ours), Some(theirs)) =
                    (faction(actor), agreement.counterpart.and_then(faction))
                else {
                    return Ok(false);
                };
                machine.record_truce(&ours, &theirs)?;
            }
            _ => return Ok(false),
        }
        info!(%actor, agreement = %agreement.kind, "negotiated agreement applied");
        self.report.agreement_applied = true;
        Ok(true)
    }

    fn open_window(
        &mut self,
        machine: &mut CombatStateMachine,
        index: usize,
        pending: PendingAttack,
        outcome: ActionOutcome,
        reactions: &dyn ReactionDecider,
        players: PlayerReactions<'_>,
    ) -> Result<StepResult, FlowError> {
        let trigger = pending.trigger();
        let eligible = machine.eligible_reactors(&trigger);
        machine.open_reaction_window(trigger.clone(), eligible.clone())?;

        let mut awaiting = Vec::new();
        for reactor in eligible {
            let controller = machine.combatant(reactor).map(|c| c.controller);
            let decider = match (controller, players) {
                (Some(Controller::Player), PlayerReactions::Pause) => {
                    awaiting.push(reactor);
                    continue;
                }
                (Some(Controller::Player), PlayerReactions::Decide(decider)) => decider,
                _ => reactions,
            };
            if let Some(kind) = decider.decide(machine, reactor, &trigger)
                && let Err(err) = machine.queue_reaction(reactor, kind)
            {
                warn!(%reactor, reaction = %kind, error = %err, "reaction not queued");
            }
        }

        if !awaiting.is_empty() {
            info!(actor = %self.actor(), reactors = ?awaiting, "turn paused for player reaction");
            self.suspended = Some(SuspendedAttack {
                index,
                pending,
                outcome,
                awaiting: awaiting.clone(),
            });
            return Ok(StepResult::AwaitingReaction {
                reactors: awaiting,
                trigger,
            });
        }
        self.finish_attack(machine, index, pending, outcome)
    }

    fn finish_attack(
        &mut self,
        machine: &mut CombatStateMachine,
        index: usize,
        pending: PendingAttack,
        outcome: ActionOutcome,
    ) -> Result<StepResult, FlowError> {
        machine.close_reaction_window()?;
        let resolution = machine.resolve_reactions()?;
        let attack = machine.apply_pending_attack(pending, resolution.intercepted)?;
        if !resolution.reports.is_empty() {
            self.report.reactions.push(resolution);
        }
        self.report.attacks.push(attack);
        self.after_record(machine, index, PhaseStep::Action, Some(outcome))
    }

    /// Advances the cursor and lines the state machine up with the next
    /// record, or concludes the turn after the last one.
    fn after_record(
        &mut self,
        machine: &mut CombatStateMachine,
        index: usize,
        step: PhaseStep,
        outcome: Option<ActionOutcome>,
    ) -> Result<StepResult, FlowError> {
        self.cursor = index + 1;
        let actor = self.actor();

        if machine.is_over() {
            return Ok(self.complete(machine));
        }
        if !machine.is_active(actor) {
            machine.advance_turn()?;
            return Ok(self.complete(machine));
        }
        if step == PhaseStep::FinalMovement {
            return self.conclude(machine);
        }

        if let Some(next) = self.records.get(self.cursor) {
            let target = next.step.expected_phase();
            while machine.phase() != target {
                if machine.phase() == TurnPhase::EndTurn {
                    return Err(self.mismatch(self.cursor, next.step, machine.phase()));
                }
                machine.next_phase()?;
            }
        }
        Ok(StepResult::Executed {
            index,
            step,
            outcome,
        })
    }

    /// END_TURN bookkeeping: a fleeing ship on its retreat edge withdraws,
    /// then the initiative passes on.
    fn conclude(&mut self, machine: &mut CombatStateMachine) -> Result<StepResult, FlowError> {
        let actor = self.actor();
        if self.report.plan.strategy == Strategy::Flee && machine.positions().at_retreat_edge(actor) {
            machine.record_withdrawal(actor)?;
            self.report.withdrew = true;
        }
        if !machine.is_over() {
            machine.next_phase()?;
        }
        Ok(self.complete(machine))
    }

    fn complete(&mut self, machine: &CombatStateMachine) -> StepResult {
        self.finished = true;
        self.cursor = self.records.len();
        self.report.combat_over = machine.is_over();
        self.report.next = if machine.is_over() {
            None
        } else {
            machine.current()
        };
        debug!(
            actor = %self.actor(),
            outcomes = self.report.outcomes.len(),
            over = self.report.combat_over,
            "turn completed"
        );
        StepResult::Completed(self.report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use crate::ai::{Agreement, DeclineReactions};
    use combat_core::{ActionKind, CombatError, ErrorSeverity};

    const NAVY: CombatantId = CombatantId(1);
    const PIRATE: CombatantId = CombatantId(2);

    fn attack_plan() -> DecisionPlan {
        let mut plan = DecisionPlan::new(NAVY, 1, Strategy::Attack);
        plan.actions.push(PlannedAction::fire(PIRATE, 0));
        plan.bonus_actions
            .push(PlannedAction::at(ActionKind::JamSensors, PIRATE));
        plan.final_movement = Some(PlannedAction::at(ActionKind::MoveCloser, PIRATE));
        plan
    }

    fn player_duel() -> CombatStateMachine {
        let mut pirate = scripted(2, "Pirates", &[], &[]);
        pirate.controller = Controller::Player;
        begin(vec![scripted(1, "Navy", &[15], &[9]), pirate])
    }

    #[test]
    fn records_follow_plan_order() {
        let steps: Vec<PhaseStep> = phase_records(&attack_plan()).iter().map(|r| r.step).collect();
        assert_eq!(
            steps,
            vec![
                PhaseStep::Movement,
                PhaseStep::Action,
                PhaseStep::BonusAction,
                PhaseStep::FinalMovement
            ]
        );
    }

    #[test]
    fn out_of_order_step_poisons_the_turn() {
        let mut machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        machine.next_phase().unwrap();
        let mut turn = SteppedTurn::new(attack_plan());

        let err = turn
            .step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::PhaseMismatch {
                index: 0,
                expected: TurnPhase::Movement,
                actual: TurnPhase::Action,
                ..
            }
        ));
        assert_eq!(err.severity(), ErrorSeverity::Fatal);

        let again = turn
            .step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap_err();
        assert!(matches!(again, FlowError::Poisoned));
    }

    #[test]
    fn paused_action_resumes_without_replay() {
        let mut machine = player_duel();
        let mut turn = SteppedTurn::new(attack_plan());
        let pause = PlayerReactions::Pause;

        let first = turn.step(&mut machine, &DeclineReactions, pause).unwrap();
        assert!(matches!(first, StepResult::Executed { index: 0, step: PhaseStep::Movement, .. }));

        let paused = turn.step(&mut machine, &DeclineReactions, pause).unwrap();
        let StepResult::AwaitingReaction { reactors, trigger } = paused else {
            panic!("expected a reaction pause, got {paused:?}");
        };
        assert_eq!(reactors, vec![PIRATE]);
        assert_eq!(trigger.actor, NAVY);
        assert!(matches!(
            turn.step(&mut machine, &DeclineReactions, pause),
            Err(FlowError::AwaitingReaction)
        ));

        turn.respond(&mut machine, PIRATE, Some(ActionKind::EvasiveManeuvers))
            .unwrap();
        let resumed = turn.resume_after_reaction(&mut machine).unwrap();
        assert!(matches!(resumed, StepResult::Executed { index: 1, step: PhaseStep::Action, .. }));

        let bonus = turn.step(&mut machine, &DeclineReactions, pause).unwrap();
        assert!(matches!(bonus, StepResult::Executed { index: 2, step: PhaseStep::BonusAction, .. }));

        let StepResult::Completed(report) =
            turn.step(&mut machine, &DeclineReactions, pause).unwrap()
        else {
            panic!("turn should complete after final movement");
        };
        let kinds: Vec<ActionKind> = report.outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::FireWeapon, ActionKind::JamSensors, ActionKind::MoveCloser]
        );
        assert_eq!(report.attacks.len(), 1);
        assert_eq!(report.reactions.len(), 1);
        assert_eq!(report.reactions[0].reports[0].kind, ActionKind::EvasiveManeuvers);
        assert_eq!(report.next, Some(PIRATE));
        assert_eq!(machine.current(), Some(PIRATE));
        assert!(matches!(
            turn.step(&mut machine, &DeclineReactions, pause),
            Err(FlowError::Finished)
        ));
    }

    #[test]
    fn respond_rejects_unawaited_reactor() {
        let mut machine = player_duel();
        let mut turn = SteppedTurn::new(attack_plan());
        assert!(matches!(
            turn.respond(&mut machine, PIRATE, None),
            Err(FlowError::NotAwaitingReaction)
        ));

        turn.step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap();
        turn.step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap();
        assert!(matches!(
            turn.respond(&mut machine, NAVY, None),
            Err(FlowError::NotAwaitedReactor { .. })
        ));
        assert_eq!(turn.awaiting(), &[PIRATE]);
    }

    #[test]
    fn decided_player_reactions_do_not_pause() {
        let mut machine = player_duel();
        let mut turn = SteppedTurn::new(attack_plan());
        let players = PlayerReactions::Decide(&DeclineReactions);

        let mut results = Vec::new();
        loop {
            let result = turn.step(&mut machine, &DeclineReactions, players).unwrap();
            let done = result.is_completed();
            results.push(result);
            if done {
                break;
            }
        }
        assert_eq!(results.len(), 4);
        assert!(results
            .iter()
            .all(|r| !matches!(r, StepResult::AwaitingReaction { .. })));
    }

    #[test]
    fn fleeing_ship_withdraws_at_the_edge() {
        let mut machine = skirmish(&[("Navy", 20), ("Pirates", 100)]);
        let mut plan = DecisionPlan::new(NAVY, 1, Strategy::Flee);
        plan.movement = Some(PlannedAction::at(ActionKind::MoveFarther, PIRATE));
        plan.final_movement = Some(PlannedAction::at(ActionKind::MoveFarther, PIRATE));
        let mut turn = SteppedTurn::new(plan);

        turn.step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap();
        let StepResult::Completed(report) = turn
            .step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap()
        else {
            panic!("flight should end the turn");
        };
        assert!(report.withdrew);
        assert!(report.combat_over);
        let outcome = machine.outcome().unwrap();
        assert_eq!(outcome.winner.as_ref().map(|f| f.to_string()), Some("Pirates".to_string()));
    }

    #[test]
    fn accepted_truce_ends_the_fight_before_moving() {
        let mut machine = skirmish(&[("Navy", 40), ("Pirates", 30)]);
        let mut plan = DecisionPlan::new(NAVY, 1, Strategy::Truce);
        plan.agreement = Some(Agreement {
            kind: Strategy::Truce,
            counterpart: Some(PIRATE),
        });
        let mut turn = SteppedTurn::new(plan);

        let result = turn
            .step(&mut machine, &DeclineReactions, PlayerReactions::Pause)
            .unwrap();
        let StepResult::Completed(report) = result else {
            panic!("truce should complete the turn");
        };
        assert!(report.agreement_applied && report.combat_over);
        assert!(report.outcomes.is_empty());
        assert!(machine.outcome().unwrap().winner.is_none());
    }
}
