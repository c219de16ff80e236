//! Action catalogue, requests, and outcomes.
//!
//! An action is described once in the [`ActionRegistry`] (cost, target
//! requirement, cooldown, permitted reactions, effect) and executed by
//! [`CombatStateMachine::execute_action`](crate::engine::CombatStateMachine::execute_action),
//! which validates and spends before invoking the effect.

mod effects;
mod kind;
mod outcome;
mod registry;
mod rejection;

pub use kind::{ActionKind, ActionRequest};
pub use outcome::{ActionOutcome, AttackResolution, DamageReport, PendingAttack};
pub use registry::{ActionDefinition, ActionRegistry, EffectFn};
pub use rejection::ActionRejection;
