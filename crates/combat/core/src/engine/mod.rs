//! The combat state machine.
//!
//! [`CombatStateMachine`] is the single owner of combat state: combatants,
//! initiative order, phase, budgets, status effects, cooldowns, positions,
//! the reaction window, and the log. Every other component reads it through
//! the query surface and changes it through the narrow mutation API
//! (spend, add effect, move, queue/resolve reactions, apply damage).
//!
//! The implementation is split by concern:
//! - `turns`: phase order, turn and round advancement
//! - `actions`: validation, spending, execution, availability
//! - `reactions`: the interrupt window
//! - `damage`: attack rolls, damage application, shield restoration
//! - `outcome`: surrender, withdrawal, truce, end-of-combat detection
//! - `snapshot`: export/import
//! - `view`: read-only consumer projection

mod actions;
mod damage;
mod outcome;
mod reactions;
mod snapshot;
mod turns;
mod view;

pub use outcome::{CombatOutcome, OutcomeReason};
pub use snapshot::{CombatSnapshot, CombatantRecord};
pub use view::{AbilityAvailability, CombatView, CombatantView};

use std::collections::{BTreeMap, BTreeSet};

use crate::action::ActionRegistry;
use crate::config::CombatConfig;
use crate::positioning::PositioningModel;
use crate::ship::CombatStats;
use crate::state::{
    ActionBudget, CombatLog, Combatant, CombatantId, CooldownTracker, Faction, ReactionWindow,
    StateError, StatusEffects, TurnPhase,
};

/// One slot of the initiative order, fixed for the encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitiativeEntry {
    pub id: CombatantId,
    pub roll: i32,
    pub initiative: i32,
}

/// Turn/phase state machine and owner of all combat state.
#[derive(Debug)]
pub struct CombatStateMachine {
    config: CombatConfig,
    registry: ActionRegistry,
    combatants: BTreeMap<CombatantId, Combatant>,
    roster: Vec<CombatantId>,
    initiative: Vec<InitiativeEntry>,
    turn_index: usize,
    round: u32,
    phase: TurnPhase,
    started: bool,
    budgets: BTreeMap<CombatantId, ActionBudget>,
    effects: BTreeMap<CombatantId, StatusEffects>,
    cooldowns: CooldownTracker,
    positions: PositioningModel,
    window: Option<ReactionWindow>,
    log: CombatLog,
    outcome: Option<CombatOutcome>,
}

impl CombatStateMachine {
    pub fn new(config: CombatConfig) -> Result<Self, StateError> {
        Self::with_registry(config, ActionRegistry::standard())
    }

    /// Creates a state machine with an injected action catalogue.
    ///
    /// Fails when the lane geometry of `config` is inconsistent.
    pub fn with_registry(config: CombatConfig, registry: ActionRegistry) -> Result<Self, StateError> {
        Ok(Self {
            positions: PositioningModel::new(&config)?,
            log: CombatLog::new(config.log_capacity),
            config,
            registry,
            combatants: BTreeMap::new(),
            roster: Vec::new(),
            initiative: Vec::new(),
            turn_index: 0,
            round: 0,
            phase: TurnPhase::Movement,
            started: false,
            budgets: BTreeMap::new(),
            effects: BTreeMap::new(),
            cooldowns: CooldownTracker::new(),
            window: None,
            outcome: None,
        })
    }

    /// Builds and starts a combat from a roster.
    pub fn begin<I>(config: CombatConfig, roster: I) -> Result<Self, StateError>
    where
        I: IntoIterator<Item = Combatant>,
    {
        let mut machine = Self::new(config)?;
        for combatant in roster {
            machine.add_combatant(combatant)?;
        }
        machine.start()?;
        Ok(machine)
    }

    /// Adds a combatant before the combat starts.
    pub fn add_combatant(&mut self, combatant: Combatant) -> Result<(), StateError> {
        if self.started {
            return Err(StateError::AlreadyStarted);
        }
        if self.combatants.contains_key(&combatant.id) {
            return Err(StateError::DuplicateCombatant { id: combatant.id });
        }
        if self.combatants.len() >= CombatConfig::MAX_COMBATANTS {
            return Err(StateError::RosterFull {
                max: CombatConfig::MAX_COMBATANTS,
            });
        }
        self.roster.push(combatant.id);
        self.combatants.insert(combatant.id, combatant);
        Ok(())
    }

    /// Places combatants, rolls initiative once, and opens round 1.
    pub fn start(&mut self) -> Result<(), StateError> {
        if self.started {
            return Err(StateError::AlreadyStarted);
        }
        let factions: BTreeSet<&Faction> = self.combatants.values().map(|c| &c.faction).collect();
        if factions.len() < 2 {
            return Err(StateError::NotEnoughFactions);
        }

        let placements: Vec<(CombatantId, Faction)> = self
            .roster
            .iter()
            .filter_map(|id| self.combatants.get(id).map(|c| (*id, c.faction.clone())))
            .collect();
        self.positions.initialize(placements);

        self.roll_initiative();

        let grant = self.config.budget;
        for (id, combatant) in &self.combatants {
            let movement = combatant.ship.combat_stats().speed;
            self.budgets.insert(*id, ActionBudget::granted(&grant, movement));
            self.effects.insert(*id, StatusEffects::empty());
        }

        self.started = true;
        self.round = 1;
        self.turn_index = 0;
        self.phase = TurnPhase::Movement;

        let order = self
            .initiative
            .iter()
            .map(|e| format!("{} ({})", self.name_of(e.id), e.roll))
            .collect::<Vec<_>>()
            .join(", ");
        self.record(format!("Combat begins. Initiative: {order}"));
        if let Some(current) = self.current() {
            tracing::info!(round = self.round, combatant = %current, "first turn");
            self.record(format!("Round 1: {}'s turn", self.name_of(current)));
        }
        Ok(())
    }

    // ========================================================================
    // Query surface
    // ========================================================================

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// The combatant whose turn it is.
    pub fn current(&self) -> Option<CombatantId> {
        if !self.started {
            return None;
        }
        self.initiative.get(self.turn_index).map(|e| e.id)
    }

    pub fn initiative_order(&self) -> &[InitiativeEntry] {
        &self.initiative
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Combatants in id order.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn is_active(&self, id: CombatantId) -> bool {
        self.combatants.get(&id).is_some_and(|c| c.is_active())
    }

    /// Display name, or the id if unknown.
    pub fn name_of(&self, id: CombatantId) -> String {
        self.combatants
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn ship_stats(&self, id: CombatantId) -> Option<CombatStats> {
        self.combatants.get(&id).map(|c| c.ship.combat_stats())
    }

    pub fn budget(&self, id: CombatantId) -> Option<&ActionBudget> {
        self.budgets.get(&id)
    }

    pub fn status_effects(&self, id: CombatantId) -> Option<&StatusEffects> {
        self.effects.get(&id)
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn positions(&self) -> &PositioningModel {
        &self.positions
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn reaction_window(&self) -> Option<&ReactionWindow> {
        self.window.as_ref()
    }

    pub fn outcome(&self) -> Option<&CombatOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Factions that still have at least one active combatant.
    pub fn active_factions(&self) -> BTreeSet<Faction> {
        self.combatants
            .values()
            .filter(|c| c.is_active())
            .map(|c| c.faction.clone())
            .collect()
    }

    /// Active combatants of other factions.
    pub fn enemies_of(&self, id: CombatantId) -> Vec<CombatantId> {
        let Some(me) = self.combatants.get(&id) else {
            return Vec::new();
        };
        self.combatants
            .values()
            .filter(|c| c.is_active() && c.faction != me.faction)
            .map(|c| c.id)
            .collect()
    }

    /// Active combatants of the same faction, excluding `id`.
    pub fn allies_of(&self, id: CombatantId) -> Vec<CombatantId> {
        let Some(me) = self.combatants.get(&id) else {
            return Vec::new();
        };
        self.combatants
            .values()
            .filter(|c| c.is_active() && c.faction == me.faction && c.id != id)
            .map(|c| c.id)
            .collect()
    }

    /// Appends a free-form entry (AI reasoning, negotiation notes) to the log.
    pub fn annotate(&mut self, message: impl Into<String>) {
        self.record(message);
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Appends a log entry stamped with the current round and phase.
    pub(crate) fn record(&mut self, message: impl Into<String>) {
        self.log.push(self.round, self.phase, message);
    }

    fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, StateError> {
        self.combatants
            .get_mut(&id)
            .ok_or(StateError::UnknownCombatant { id })
    }
}
