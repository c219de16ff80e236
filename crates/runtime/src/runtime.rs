//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive the encounter.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use combat_core::{CombatOutcome, CombatStateMachine};

use crate::ai::{AiDecisionEngine, Negotiator, ReactionDecider};
use crate::api::{AutopilotController, CombatHandle, PlayerController, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::flow::TurnFlowOrchestrator;
use crate::scenario::Scenario;
use crate::workers::{AdvanceReport, SimulationWorker};

/// Main runtime that orchestrates the combat simulation
///
/// Design: the worker exclusively owns the state machine.
/// [`CombatHandle`] provides a cloneable façade for clients.
pub struct CombatRuntime {
    handle: CombatHandle,
    controller: Box<dyn PlayerController>,
    worker: JoinHandle<CombatStateMachine>,
}

impl CombatRuntime {
    /// Create a new runtime builder
    pub fn builder() -> CombatRuntimeBuilder {
        CombatRuntimeBuilder::new()
    }

    /// Spawns a runtime with default collaborators. Must be called inside a
    /// Tokio runtime.
    pub fn start(config: RuntimeConfig, machine: CombatStateMachine) -> Self {
        Self::builder().config(config).build(machine)
    }

    /// Builds the scenario's roster and spawns a runtime for it.
    pub fn from_scenario(config: RuntimeConfig, scenario: &Scenario) -> Result<Self> {
        let machine = scenario.build(&config)?;
        Ok(Self::start(config, machine))
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> CombatHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Set the controller that answers player prompts
    pub fn set_player_controller(&mut self, controller: impl PlayerController + 'static) {
        self.controller = Box::new(controller);
    }

    /// Advances once, answering any player prompt through the controller
    /// until the worker reports progress.
    pub async fn step(&self) -> Result<AdvanceReport> {
        let mut report = self.handle.advance().await?;
        loop {
            report = match report {
                AdvanceReport::AwaitingPlayerPlan { actor, suggestion } => {
                    let view = self.handle.query_view().await?;
                    let plan = self
                        .controller
                        .provide_plan(&view, actor, *suggestion)
                        .await?;
                    self.handle.submit_player_plan(plan).await?
                }
                AdvanceReport::AwaitingReaction { reactors, trigger } => {
                    let view = self.handle.query_view().await?;
                    for reactor in reactors {
                        let reaction = self
                            .controller
                            .provide_reaction(&view, reactor, &trigger)
                            .await?;
                        self.handle.submit_reaction(reactor, reaction).await?;
                    }
                    self.handle.advance().await?
                }
                other => return Ok(other),
            };
        }
    }

    /// Runs until the combat ends or `max_turns` turns have completed.
    /// Returns the outcome if there is one.
    pub async fn run(&self, max_turns: usize) -> Result<Option<CombatOutcome>> {
        let mut turns = 0;
        while turns < max_turns {
            match self.step().await? {
                AdvanceReport::CombatOver(outcome) => return Ok(Some(outcome)),
                AdvanceReport::TurnCompleted(_) => turns += 1,
                _ => {}
            }
        }
        Ok(self.handle.query_view().await?.outcome)
    }

    /// Shutdown the runtime gracefully and hand back the final state.
    ///
    /// Waits until every cloned [`CombatHandle`] has been dropped.
    pub async fn shutdown(self) -> Result<CombatStateMachine> {
        drop(self.handle);
        self.worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`CombatRuntime`]
pub struct CombatRuntimeBuilder {
    config: RuntimeConfig,
    negotiator: Option<Arc<dyn Negotiator>>,
    reactions: Option<Arc<dyn ReactionDecider>>,
    player_reactions: Option<Arc<dyn ReactionDecider>>,
    controller: Option<Box<dyn PlayerController>>,
}

impl CombatRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            negotiator: None,
            reactions: None,
            player_reactions: None,
            controller: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Negotiation counterpart for AI offers (declines everything by default)
    pub fn negotiator(mut self, negotiator: Arc<dyn Negotiator>) -> Self {
        self.negotiator = Some(negotiator);
        self
    }

    /// Reaction policy for AI-controlled reactors
    pub fn reaction_decider(mut self, decider: Arc<dyn ReactionDecider>) -> Self {
        self.reactions = Some(decider);
        self
    }

    /// Reaction policy for player reactors when a turn runs without pausing
    pub fn player_reaction_decider(mut self, decider: Arc<dyn ReactionDecider>) -> Self {
        self.player_reactions = Some(decider);
        self
    }

    pub fn player_controller(mut self, controller: impl PlayerController + 'static) -> Self {
        self.controller = Some(Box::new(controller));
        self
    }

    /// Spawns the simulation worker. Must be called inside a Tokio runtime.
    pub fn build(self, machine: CombatStateMachine) -> CombatRuntime {
        let config = self.config;

        let mut engine = AiDecisionEngine::new(config.ai.clone(), config.profiles.clone());
        if let Some(negotiator) = self.negotiator {
            engine = engine.with_negotiator(negotiator);
        }
        let mut orchestrator = TurnFlowOrchestrator::new(engine);
        if let Some(reactions) = self.reactions {
            orchestrator = orchestrator.with_reactions(reactions);
        }
        if let Some(reactions) = self.player_reactions {
            orchestrator = orchestrator.with_player_reactions(reactions);
        }

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(config.event_buffer_size);

        let worker = SimulationWorker::new(
            machine,
            orchestrator,
            config.mode,
            config.view_log_tail,
            command_rx,
            event_bus.clone(),
        );
        let worker = tokio::spawn(worker.run());

        CombatRuntime {
            handle: CombatHandle::new(command_tx, event_bus),
            controller: self
                .controller
                .unwrap_or_else(|| Box::new(AutopilotController)),
            worker,
        }
    }
}
