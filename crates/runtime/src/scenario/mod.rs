//! Scenario files: which ships fight, for whom, and under whose control.
//!
//! Scenarios are RON documents listing ship specs with their faction,
//! controller, and AI profile. Combatant ids are allocated at load time in
//! file order starting at 1, so the same file always yields the same roster.

use std::path::Path;

use combat_core::{
    CombatStateMachine, Combatant, CombatantId, Controller, ExperienceTier, Faction,
    PersonalityKind, ShipSpec, StandardShip, compute_seed,
};
use serde::{Deserialize, Serialize};

use crate::api::{Result, RuntimeError};
use crate::config::{ProfileCatalog, RuntimeConfig, read_file};

/// One ship entry in a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioShip {
    pub faction: String,
    #[serde(default)]
    pub controller: Controller,
    #[serde(default)]
    pub personality: Option<PersonalityKind>,
    #[serde(default)]
    pub experience: Option<ExperienceTier>,
    /// Dice seed; derived from the scenario seed and the ship's slot when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    pub spec: ShipSpec,
}

/// A complete engagement setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub ships: Vec<ScenarioShip>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, seed: u64, ships: Vec<ScenarioShip>) -> Self {
        Self {
            name: name.into(),
            seed,
            ships,
        }
    }

    /// Loads a scenario from a RON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = read_file(path)?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self> {
        let scenario: Scenario =
            ron::from_str(content).map_err(|e| RuntimeError::InvalidScenario {
                reason: e.to_string(),
            })?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if self.ships.is_empty() {
            return Err(RuntimeError::InvalidScenario {
                reason: format!("scenario '{}' lists no ships", self.name),
            });
        }
        if let Some(ship) = self.ships.iter().find(|s| s.spec.max_hull == 0) {
            return Err(RuntimeError::InvalidScenario {
                reason: format!("{} has no hull", ship.spec.name),
            });
        }
        Ok(())
    }

    /// Builds combatants, applying experience-tier stat scaling.
    pub fn into_roster(&self, profiles: &ProfileCatalog) -> Vec<Combatant> {
        self.ships
            .iter()
            .enumerate()
            .map(|(slot, entry)| {
                let id = CombatantId(slot as u32 + 1);
                let seed = entry
                    .seed
                    .unwrap_or_else(|| compute_seed(self.seed, slot as u64, id.value(), 0));
                let mut ship = StandardShip::from_spec(entry.spec.clone(), seed);
                if let Some(tier) = entry.experience {
                    ship = ship.with_experience(&profiles.tier(tier));
                }

                let mut combatant = Combatant::new(
                    id,
                    entry.spec.name.clone(),
                    Faction::new(entry.faction.clone()),
                    entry.controller,
                    Box::new(ship),
                );
                if let Some(kind) = entry.personality {
                    combatant = combatant.with_personality(kind);
                }
                if let Some(tier) = entry.experience {
                    combatant = combatant.with_experience(tier);
                }
                combatant
            })
            .collect()
    }

    /// Builds and starts a state machine for this scenario.
    pub fn build(&self, config: &RuntimeConfig) -> Result<CombatStateMachine> {
        let roster = self.into_roster(&config.profiles);
        let machine = CombatStateMachine::begin(config.combat.clone(), roster)?;
        tracing::info!(
            scenario = %self.name,
            combatants = self.ships.len(),
            round = machine.round(),
            "scenario started"
        );
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::HullClass;

    fn entry(faction: &str, class: HullClass) -> ScenarioShip {
        ScenarioShip {
            faction: faction.to_string(),
            controller: Controller::Ai,
            personality: None,
            experience: None,
            seed: None,
            spec: ShipSpec::nominal(format!("{faction} {class}"), class),
        }
    }

    #[test]
    fn roster_ids_follow_file_order() {
        let scenario = Scenario::new(
            "skirmish",
            7,
            vec![entry("Navy", HullClass::Frigate), entry("Pirates", HullClass::Corvette)],
        );
        let roster = scenario.into_roster(&ProfileCatalog::default());
        let ids: Vec<u32> = roster.iter().map(|c| c.id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(roster[1].faction, Faction::new("Pirates"));
    }

    #[test]
    fn experience_scales_hull() {
        let mut veteran = entry("Navy", HullClass::Destroyer);
        veteran.experience = Some(ExperienceTier::Veteran);
        let scenario = Scenario::new("scaled", 1, vec![veteran, entry("Pirates", HullClass::Destroyer)]);
        let roster = scenario.into_roster(&ProfileCatalog::default());

        let base = HullClass::Destroyer.nominal_stats().max_hull;
        assert!(roster[0].ship.combat_stats().max_hull > base);
        assert_eq!(roster[1].ship.combat_stats().max_hull, base);
        assert_eq!(roster[0].experience, Some(ExperienceTier::Veteran));
    }

    #[test]
    fn empty_scenario_is_rejected() {
        let err = Scenario::from_ron("(name: \"void\", ships: [])").unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidScenario { .. }));
    }
}
