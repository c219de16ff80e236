//! Snapshot export and import.
//!
//! A snapshot carries every piece of combat state the state machine owns,
//! except the ship objects themselves: hull and shield meters are recorded,
//! and the caller re-attaches a ship per combatant on import.

use std::collections::{BTreeMap, BTreeSet};

use super::{CombatOutcome, CombatStateMachine, InitiativeEntry};
use crate::action::ActionRegistry;
use crate::config::CombatConfig;
use crate::profile::{ExperienceTier, PersonalityKind};
use crate::ship::ShipSystems;
use crate::state::{
    ActionBudget, CombatLog, CombatPerformance, Combatant, CombatantId, CombatantStatus,
    Controller, CooldownTracker, Faction, StateError, StatusEffects, TurnPhase,
};

/// Identity and meters of one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantRecord {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    pub controller: Controller,
    pub personality: Option<PersonalityKind>,
    pub experience: Option<ExperienceTier>,
    pub hull: u32,
    pub shields: u32,
    pub performance: CombatPerformance,
    pub scanned: BTreeSet<CombatantId>,
    pub status: CombatantStatus,
}

/// Serializable copy of the combat state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatSnapshot {
    pub round: u32,
    pub turn_index: usize,
    pub phase: TurnPhase,
    pub started: bool,
    pub initiative: Vec<InitiativeEntry>,
    /// Roster order.
    pub combatants: Vec<CombatantRecord>,
    pub budgets: Vec<(CombatantId, ActionBudget)>,
    pub effects: Vec<(CombatantId, StatusEffects)>,
    pub cooldowns: CooldownTracker,
    pub positions: Vec<(CombatantId, u8)>,
    pub log: CombatLog,
    pub outcome: Option<CombatOutcome>,
}

impl CombatStateMachine {
    /// Exports the current state. Refused while a reaction window is open.
    pub fn export_snapshot(&self) -> Result<CombatSnapshot, StateError> {
        if self.window.is_some() {
            return Err(StateError::ReactionWindowOpen);
        }
        let combatants = self
            .roster
            .iter()
            .filter_map(|id| self.combatants.get(id))
            .map(|c| CombatantRecord {
                id: c.id,
                name: c.name.clone(),
                faction: c.faction.clone(),
                controller: c.controller,
                personality: c.personality,
                experience: c.experience,
                hull: c.ship.current_hull(),
                shields: c.ship.current_shields(),
                performance: c.performance,
                scanned: c.scanned.clone(),
                status: c.status,
            })
            .collect();

        Ok(CombatSnapshot {
            round: self.round,
            turn_index: self.turn_index,
            phase: self.phase,
            started: self.started,
            initiative: self.initiative.clone(),
            combatants,
            budgets: self.budgets.iter().map(|(id, b)| (*id, b.clone())).collect(),
            effects: self.effects.iter().map(|(id, e)| (*id, e.clone())).collect(),
            cooldowns: self.cooldowns.clone(),
            positions: self.positions.lanes().collect(),
            log: self.log.clone(),
            outcome: self.outcome.clone(),
        })
    }

    /// Rebuilds a state machine from a snapshot.
    ///
    /// `attach` supplies the ship for each record; its hull and shield meters
    /// are overwritten with the recorded values.
    pub fn import_snapshot<F>(
        snapshot: CombatSnapshot,
        config: CombatConfig,
        registry: ActionRegistry,
        mut attach: F,
    ) -> Result<Self, StateError>
    where
        F: FnMut(&CombatantRecord) -> Option<Box<dyn ShipSystems>>,
    {
        let mut machine = Self::with_registry(config, registry)?;

        let mut placements = Vec::with_capacity(snapshot.combatants.len());
        for record in &snapshot.combatants {
            let mut ship = attach(record).ok_or(StateError::ShipMissing { id: record.id })?;
            ship.set_current_hull(record.hull);
            ship.set_current_shields(record.shields);

            let mut combatant = Combatant::new(
                record.id,
                record.name.clone(),
                record.faction.clone(),
                record.controller,
                ship,
            );
            combatant.personality = record.personality;
            combatant.experience = record.experience;
            combatant.performance = record.performance;
            combatant.scanned = record.scanned.clone();
            combatant.status = record.status;

            placements.push((record.id, record.faction.clone()));
            machine.add_combatant(combatant)?;
        }

        for entry in &snapshot.initiative {
            if !machine.combatants.contains_key(&entry.id) {
                return Err(StateError::InvalidSnapshot {
                    reason: format!("initiative entry for unknown combatant {}", entry.id),
                });
            }
        }
        if snapshot.started && snapshot.turn_index >= snapshot.initiative.len() {
            return Err(StateError::InvalidSnapshot {
                reason: format!(
                    "turn index {} out of range for {} initiative entries",
                    snapshot.turn_index,
                    snapshot.initiative.len()
                ),
            });
        }

        machine.positions.initialize(placements);
        let factions: BTreeMap<CombatantId, Faction> = snapshot
            .combatants
            .iter()
            .map(|r| (r.id, r.faction.clone()))
            .collect();
        for (id, lane) in &snapshot.positions {
            let faction = factions.get(id).ok_or_else(|| StateError::InvalidSnapshot {
                reason: format!("position for unknown combatant {id}"),
            })?;
            machine.positions.set_lane(*id, faction, *lane);
        }

        machine.round = snapshot.round;
        machine.turn_index = snapshot.turn_index;
        machine.phase = snapshot.phase;
        machine.started = snapshot.started;
        machine.initiative = snapshot.initiative;
        machine.budgets = snapshot.budgets.into_iter().collect();
        machine.effects = snapshot.effects.into_iter().collect();
        machine.cooldowns = snapshot.cooldowns;
        machine.log = snapshot.log;
        machine.outcome = snapshot.outcome;

        tracing::info!(
            round = machine.round,
            combatants = machine.combatants.len(),
            "combat state imported"
        );
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::action::{ActionKind, ActionRequest};

    fn reattach(record: &CombatantRecord) -> Option<Box<dyn ShipSystems>> {
        Some(Box::new(ship(&record.name, 0)))
    }

    fn played_duel() -> CombatStateMachine {
        let mut machine = default_duel();
        machine.apply_damage(CombatantId(2), 55, Some(CombatantId(1))).unwrap();
        let outcome = machine.execute_action(
            ActionRequest::new(CombatantId(1), ActionKind::MoveCloser).with_target(CombatantId(2)),
        );
        assert!(outcome.success);
        machine
            .execute_action(ActionRequest::new(CombatantId(1), ActionKind::BoostShields));
        machine
    }

    #[test]
    fn export_import_preserves_state() {
        let machine = played_duel();
        let snapshot = machine.export_snapshot().unwrap();

        let restored = CombatStateMachine::import_snapshot(
            snapshot.clone(),
            CombatConfig::default(),
            ActionRegistry::standard(),
            reattach,
        )
        .unwrap();

        assert_eq!(restored.round(), machine.round());
        assert_eq!(restored.current(), machine.current());
        assert_eq!(restored.phase(), machine.phase());
        assert_eq!(restored.positions().lane(CombatantId(1)), 3);
        assert_eq!(restored.combatant(CombatantId(2)).unwrap().ship.current_hull(), 85);
        assert_eq!(restored.combatant(CombatantId(2)).unwrap().ship.current_shields(), 0);
        assert_eq!(restored.budget(CombatantId(1)), machine.budget(CombatantId(1)));
        assert_eq!(restored.log().len(), machine.log().len());
        assert_eq!(restored.export_snapshot().unwrap(), snapshot);
    }

    #[test]
    fn import_requires_every_ship() {
        let snapshot = played_duel().export_snapshot().unwrap();
        let result = CombatStateMachine::import_snapshot(
            snapshot,
            CombatConfig::default(),
            ActionRegistry::standard(),
            |record| (record.id == CombatantId(1)).then(|| reattach(record)).flatten(),
        );
        assert!(matches!(result, Err(StateError::ShipMissing { id }) if id == CombatantId(2)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_survives_json() {
        let snapshot = played_duel().export_snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: CombatSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.combatants, snapshot.combatants);
        assert_eq!(decoded.positions, snapshot.positions);
        assert_eq!(decoded.round, snapshot.round);
    }
}
