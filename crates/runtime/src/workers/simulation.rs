//! Simulation worker that owns the authoritative [`CombatStateMachine`].
//!
//! Receives commands from [`CombatHandle`](crate::api::CombatHandle), runs
//! turns through the [`TurnFlowOrchestrator`], and publishes events to the
//! [`EventBus`].

use combat_core::{
    AbilityAvailability, ActionKind, ActionOutcome, CombatOutcome, CombatSnapshot,
    CombatStateMachine, CombatView, CombatantId, Controller, TriggeringAction,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::ai::DecisionPlan;
use crate::api::{Result, RuntimeError};
use crate::config::ExecutionMode;
use crate::events::{Event, EventBus, ReactionEvent, TurnEvent};
use crate::flow::{FlowError, PhaseStep, StepResult, SteppedTurn, TurnFlowOrchestrator, TurnReport};

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Drive the current turn: a whole turn or one phase record depending on
    /// the execution mode. Resumes a turn paused on a reaction window.
    Advance {
        reply: oneshot::Sender<Result<AdvanceReport>>,
    },
    /// Start the current player-controlled combatant's turn with `plan`.
    SubmitPlayerPlan {
        plan: DecisionPlan,
        reply: oneshot::Sender<Result<AdvanceReport>>,
    },
    /// Answer a paused reaction window; `None` declines.
    SubmitReaction {
        reactor: CombatantId,
        reaction: Option<ActionKind>,
        reply: oneshot::Sender<Result<()>>,
    },
    QueryView {
        reply: oneshot::Sender<CombatView>,
    },
    AvailableActions {
        id: CombatantId,
        reply: oneshot::Sender<Vec<ActionKind>>,
    },
    Availability {
        id: CombatantId,
        kind: ActionKind,
        reply: oneshot::Sender<AbilityAvailability>,
    },
    ExportSnapshot {
        reply: oneshot::Sender<Result<CombatSnapshot>>,
    },
    /// Plan the AI would follow for `actor` right now.
    SuggestPlan {
        actor: CombatantId,
        reply: oneshot::Sender<DecisionPlan>,
    },
}

/// Result of one `advance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AdvanceReport {
    TurnCompleted(Box<TurnReport>),
    PhaseExecuted {
        actor: CombatantId,
        index: usize,
        step: PhaseStep,
        outcome: Option<Box<ActionOutcome>>,
    },
    /// A player holds the initiative; submit a plan to continue.
    AwaitingPlayerPlan {
        actor: CombatantId,
        suggestion: Box<DecisionPlan>,
    },
    /// Player reactors must answer, then `advance` resumes the turn.
    AwaitingReaction {
        reactors: Vec<CombatantId>,
        trigger: TriggeringAction,
    },
    CombatOver(CombatOutcome),
}

/// Background task that processes combat commands.
pub struct SimulationWorker {
    machine: CombatStateMachine,
    orchestrator: TurnFlowOrchestrator,
    mode: ExecutionMode,
    view_log_tail: usize,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    turn: Option<SteppedTurn>,
    log_cursor: u64,
    announced: Option<(u32, CombatantId)>,
    outcome_published: bool,
}

impl SimulationWorker {
    pub fn new(
        machine: CombatStateMachine,
        orchestrator: TurnFlowOrchestrator,
        mode: ExecutionMode,
        view_log_tail: usize,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            combatants = machine.combatants().count(),
            ?mode,
            "simulation worker initialized"
        );
        Self {
            machine,
            orchestrator,
            mode,
            view_log_tail,
            command_rx,
            event_bus,
            turn: None,
            log_cursor: 0,
            announced: None,
            outcome_published: false,
        }
    }

    /// Main worker loop. Returns the state machine once every handle is gone.
    pub async fn run(mut self) -> CombatStateMachine {
        self.publish_log();
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }
        debug!("simulation worker stopped");
        self.machine
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Advance { reply } => {
                let result = self.advance();
                self.after_command();
                if reply.send(result).is_err() {
                    debug!("Advance reply channel closed (caller dropped)");
                }
            }
            Command::SubmitPlayerPlan { plan, reply } => {
                let result = self.submit_player_plan(plan);
                self.after_command();
                if reply.send(result).is_err() {
                    debug!("SubmitPlayerPlan reply channel closed (caller dropped)");
                }
            }
            Command::SubmitReaction {
                reactor,
                reaction,
                reply,
            } => {
                let result = self.submit_reaction(reactor, reaction);
                self.after_command();
                if reply.send(result).is_err() {
                    debug!("SubmitReaction reply channel closed (caller dropped)");
                }
            }
            Command::QueryView { reply } => {
                if reply.send(self.machine.view(self.view_log_tail)).is_err() {
                    debug!("QueryView reply channel closed (caller dropped)");
                }
            }
            Command::AvailableActions { id, reply } => {
                if reply.send(self.machine.available_actions(id)).is_err() {
                    debug!("AvailableActions reply channel closed (caller dropped)");
                }
            }
            Command::Availability { id, kind, reply } => {
                if reply.send(self.machine.ability_availability(id, kind)).is_err() {
                    debug!("Availability reply channel closed (caller dropped)");
                }
            }
            Command::ExportSnapshot { reply } => {
                let result = self.machine.export_snapshot().map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("ExportSnapshot reply channel closed (caller dropped)");
                }
            }
            Command::SuggestPlan { actor, reply } => {
                let plan = self.orchestrator.plan(&self.machine, actor);
                if reply.send(plan).is_err() {
                    debug!("SuggestPlan reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn advance(&mut self) -> Result<AdvanceReport> {
        if self.turn.as_ref().is_some_and(SteppedTurn::is_suspended) {
            return self.resume();
        }
        if self.turn.is_some() {
            return self.drive();
        }
        if let Some(outcome) = self.machine.outcome() {
            return Ok(AdvanceReport::CombatOver(outcome.clone()));
        }

        let actor = self
            .machine
            .current()
            .ok_or(combat_core::StateError::NotStarted)?;
        let controller = self
            .machine
            .combatant(actor)
            .map(|c| c.controller)
            .unwrap_or_default();
        self.announce(actor, controller);

        if controller == Controller::Player {
            let suggestion = Box::new(self.orchestrator.plan(&self.machine, actor));
            self.event_bus.publish(Event::Turn(TurnEvent::AwaitingPlayer {
                actor,
                suggestion: suggestion.clone(),
            }));
            return Ok(AdvanceReport::AwaitingPlayerPlan { actor, suggestion });
        }

        let plan = self.orchestrator.plan(&self.machine, actor);
        self.start_turn(plan);
        self.drive()
    }

    fn submit_player_plan(&mut self, mut plan: DecisionPlan) -> Result<AdvanceReport> {
        let Some(expected) = self.machine.current() else {
            return Err(RuntimeError::NotAwaitingPlayer);
        };
        let is_player = self
            .machine
            .combatant(expected)
            .is_some_and(|c| c.controller == Controller::Player);
        if self.turn.is_some() || self.machine.is_over() || !is_player {
            return Err(RuntimeError::NotAwaitingPlayer);
        }
        if plan.actor != expected {
            return Err(RuntimeError::InvalidPlanActor {
                expected,
                provided: plan.actor,
            });
        }
        self.announce(expected, Controller::Player);
        plan.round = self.machine.round();
        self.start_turn(plan);
        self.drive()
    }

    fn submit_reaction(&mut self, reactor: CombatantId, reaction: Option<ActionKind>) -> Result<()> {
        let turn = self
            .turn
            .as_mut()
            .ok_or(RuntimeError::NotAwaitingReaction { reactor })?;
        match turn.respond(&mut self.machine, reactor, reaction) {
            Ok(()) => {
                info!(%reactor, reaction = ?reaction, "player reaction recorded");
                Ok(())
            }
            Err(FlowError::NotAwaitingReaction | FlowError::NotAwaitedReactor { .. }) => {
                Err(RuntimeError::NotAwaitingReaction { reactor })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn start_turn(&mut self, plan: DecisionPlan) {
        self.event_bus.publish(Event::Turn(TurnEvent::Planned {
            plan: Box::new(plan.clone()),
        }));
        let turn = self.orchestrator.begin_stepped(&mut self.machine, plan);
        self.turn = Some(turn);
    }

    fn resume(&mut self) -> Result<AdvanceReport> {
        let Some(turn) = self.turn.as_mut() else {
            return Err(FlowError::NotAwaitingReaction.into());
        };
        let result = turn.resume_after_reaction(&mut self.machine);
        let result = self.settle(result)?;
        match (self.mode, result) {
            (ExecutionMode::RunToCompletion, AdvanceReport::PhaseExecuted { .. }) => self.drive(),
            (_, report) => Ok(report),
        }
    }

    /// Steps the current turn: to completion or to the next pause in
    /// run-to-completion mode, one record in phase-stepped mode.
    fn drive(&mut self) -> Result<AdvanceReport> {
        loop {
            let Some(turn) = self.turn.as_mut() else {
                return Err(FlowError::Finished.into());
            };
            let result = self.orchestrator.step(turn, &mut self.machine, true);
            let report = self.settle(result)?;
            match (self.mode, report) {
                (ExecutionMode::RunToCompletion, AdvanceReport::PhaseExecuted { .. }) => continue,
                (_, report) => return Ok(report),
            }
        }
    }

    /// Publishes a step result and converts it into a report.
    fn settle(&mut self, result: std::result::Result<StepResult, FlowError>) -> Result<AdvanceReport> {
        let actor = self.turn.as_ref().map(SteppedTurn::actor);
        let step = match result {
            Ok(step) => step,
            Err(err) => {
                error!(?actor, error = %err, "turn flow aborted");
                self.turn = None;
                return Err(err.into());
            }
        };

        match step {
            StepResult::Executed {
                index,
                step,
                outcome,
            } => {
                let actor = actor.unwrap_or_default();
                let outcome = outcome.map(Box::new);
                self.event_bus.publish(Event::Turn(TurnEvent::PhaseExecuted {
                    actor,
                    index,
                    step,
                    outcome: outcome.clone(),
                }));
                Ok(AdvanceReport::PhaseExecuted {
                    actor,
                    index,
                    step,
                    outcome,
                })
            }
            StepResult::AwaitingReaction { reactors, trigger } => {
                self.event_bus.publish(Event::Reaction(ReactionEvent::Requested {
                    reactors: reactors.clone(),
                    trigger: trigger.clone(),
                }));
                Ok(AdvanceReport::AwaitingReaction { reactors, trigger })
            }
            StepResult::Completed(report) => {
                self.turn = None;
                for resolution in &report.reactions {
                    self.event_bus
                        .publish(Event::Reaction(ReactionEvent::Resolved(resolution.clone())));
                }
                let report = Box::new(report);
                self.event_bus
                    .publish(Event::Turn(TurnEvent::Completed(report.clone())));
                Ok(AdvanceReport::TurnCompleted(report))
            }
        }
    }

    fn announce(&mut self, actor: CombatantId, controller: Controller) {
        let key = (self.machine.round(), actor);
        if self.announced == Some(key) {
            return;
        }
        self.announced = Some(key);
        self.event_bus.publish(Event::Turn(TurnEvent::Started {
            actor,
            round: key.0,
            controller,
        }));
    }

    fn after_command(&mut self) {
        self.publish_log();
        if !self.outcome_published
            && let Some(outcome) = self.machine.outcome()
        {
            info!(winner = ?outcome.winner, reason = %outcome.reason, round = outcome.round, "combat over");
            self.event_bus.publish(Event::Outcome(outcome.clone()));
            self.outcome_published = true;
        }
    }

    fn publish_log(&mut self) {
        let log = self.machine.log();
        for entry in log.since(self.log_cursor) {
            self.event_bus.publish(Event::Log(entry));
        }
        self.log_cursor = log.total();
    }
}
