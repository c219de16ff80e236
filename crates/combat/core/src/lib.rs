//! Deterministic combat rules for turn-based spaceship engagements.
//!
//! `combat-core` defines the canonical rules (positioning, action catalogue,
//! turn/phase state machine, reactions, damage) and exposes pure APIs that
//! can be reused by the runtime, the headless driver, and tests. All combat
//! state mutation flows through [`engine::CombatStateMachine`]; ships plug in
//! through the [`ship::ShipSystems`] contract.
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod positioning;
pub mod profile;
pub mod rng;
pub mod ship;
pub mod state;

pub use action::{
    ActionDefinition, ActionKind, ActionOutcome, ActionRegistry, ActionRejection, ActionRequest,
    AttackResolution, DamageReport, EffectFn, PendingAttack,
};
pub use combat::{Absorption, absorb_damage, hit_probability, revalidate};
pub use config::{BandBounds, BudgetGrant, CombatConfig, ConfigError, EffectTuning};
pub use engine::{
    AbilityAvailability, CombatOutcome, CombatSnapshot, CombatStateMachine, CombatView,
    CombatantRecord, CombatantView, InitiativeEntry, OutcomeReason,
};
pub use error::{CombatError, ErrorContext, ErrorSeverity};
pub use positioning::{DistanceBand, MoveOutcome, PositioningModel, Side, StepDirection};
pub use profile::{
    ExperienceTier, PersonalityKind, PersonalityProfile, SituationalFactors, SituationalModifier,
    TargetStrategy, TierProfile,
};
pub use rng::{DiceStream, PcgRng, RngOracle, compute_seed};
pub use ship::{
    AttackContext, AttackRoll, Capabilities, CombatStats, ComponentKind, DamageDice, DamageRoll,
    DamageType, HullClass, OutOfBand, RollModifier, ShipSpec, ShipSystems, StandardShip, Weapon,
};
pub use state::{
    ActionBudget, BudgetCounts, CombatLog, CombatLogEntry, CombatPerformance, Combatant,
    CombatantId, CombatantStatus, Controller, CooldownInfo, CooldownRule, CooldownTracker, Faction,
    InsufficientResource, ReactionResolution, ReactionWindow, ResourceKind, StateError,
    StatusEffect, StatusEffects, StatusKind, TriggeringAction, TurnPhase,
};
