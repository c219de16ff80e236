//! Combatants: identity, allegiance, and the attached ship.

use std::collections::BTreeSet;

use crate::profile::{ExperienceTier, PersonalityKind};
use crate::ship::ShipSystems;
use crate::state::{CombatantId, CombatantStatus, Controller, Faction};

/// Running combat-performance counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatPerformance {
    pub attacks_made: u32,
    pub attacks_hit: u32,
    pub attacks_missed: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
}

impl CombatPerformance {
    /// Hit rate over resolved attacks; `None` before the first resolution.
    pub fn hit_rate(&self) -> Option<f32> {
        let resolved = self.attacks_hit + self.attacks_missed;
        (resolved > 0).then(|| self.attacks_hit as f32 / resolved as f32)
    }

    pub fn average_damage_per_hit(&self) -> Option<f32> {
        (self.attacks_hit > 0).then(|| self.damage_dealt as f32 / self.attacks_hit as f32)
    }
}

/// A participant in the encounter.
#[derive(Debug)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    pub controller: Controller,
    pub ship: Box<dyn ShipSystems>,
    pub personality: Option<PersonalityKind>,
    pub experience: Option<ExperienceTier>,
    pub performance: CombatPerformance,
    /// Combatants this one has scanned (exact intel).
    pub scanned: BTreeSet<CombatantId>,
    pub status: CombatantStatus,
}

impl Combatant {
    pub fn new(
        id: CombatantId,
        name: impl Into<String>,
        faction: impl Into<Faction>,
        controller: Controller,
        ship: Box<dyn ShipSystems>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            faction: faction.into(),
            controller,
            ship,
            personality: None,
            experience: None,
            performance: CombatPerformance::default(),
            scanned: BTreeSet::new(),
            status: CombatantStatus::Active,
        }
    }

    pub fn with_personality(mut self, personality: PersonalityKind) -> Self {
        self.personality = Some(personality);
        self
    }

    pub fn with_experience(mut self, tier: ExperienceTier) -> Self {
        self.experience = Some(tier);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_enemy_of(&self, other: &Combatant) -> bool {
        self.faction != other.faction
    }

    pub fn has_scanned(&self, other: CombatantId) -> bool {
        self.scanned.contains(&other)
    }
}
