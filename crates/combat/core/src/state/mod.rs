//! Combat state records owned by the state machine.
//!
//! Everything here is plain data plus local invariants (a budget cannot be
//! overspent, an effect list cannot overflow). Cross-record rules live in
//! [`crate::engine::CombatStateMachine`].

mod budget;
mod combatant;
mod cooldown;
mod error;
mod log;
mod reaction;
mod status;
mod types;

pub use budget::{ActionBudget, BudgetCounts, InsufficientResource, ResourceKind, SpentResource};
pub use combatant::{CombatPerformance, Combatant};
pub use cooldown::{
    AbilityCooldown, CooldownBlocked, CooldownEntry, CooldownInfo, CooldownRule, CooldownTracker,
};
pub use error::StateError;
pub use log::{CombatLog, CombatLogEntry};
pub use reaction::{
    ReactionQueueEntry, ReactionReport, ReactionResolution, ReactionWindow, TriggeringAction,
};
pub use status::{StatusEffect, StatusEffects, StatusKind};
pub use types::{CombatantId, CombatantStatus, Controller, Faction, TurnPhase};
