//! Runtime orchestration for the turn-based combat simulation.
//!
//! This crate wires the AI decision engine and the turn-flow orchestrator to
//! an async worker that owns the combat state. Consumers embed
//! [`CombatRuntime`] to drive turns, subscribe to events, and answer player
//! prompts through [`CombatHandle`].
//!
//! Modules are organized by responsibility:
//! - [`ai`] plans turns and picks reactions for AI-controlled ships
//! - [`flow`] executes plans, run-to-completion or one phase at a time
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`config`] and [`scenario`] load RON setup files
//! - `workers` keeps background tasks internal to the crate
pub mod ai;
pub mod api;
pub mod config;
pub mod events;
pub mod flow;
pub mod runtime;
pub mod scenario;

mod workers;

pub use ai::{
    AiDecisionEngine, AiReactionPolicy, DecisionPlan, DeclineReactions, Negotiator,
    PlannedAction, ReactionDecider, ScriptedNegotiator, Strategy, StubNegotiator,
};
pub use api::{AutopilotController, CombatHandle, PlayerController, Result, RuntimeError};
pub use config::{AiConfig, CommsFallback, ExecutionMode, ProfileCatalog, RuntimeConfig};
pub use events::{Event, EventBus, ReactionEvent, Topic, TurnEvent};
pub use flow::{FlowError, PhaseStep, StepResult, SteppedTurn, TurnFlowOrchestrator, TurnReport};
pub use runtime::{CombatRuntime, CombatRuntimeBuilder};
pub use scenario::{Scenario, ScenarioShip};
pub use workers::AdvanceReport;
