//! Battlefield view from one combatant's perspective.
//!
//! [`AiContext`] is the blackboard every planning step reads from. It never
//! mutates the state machine. Enemy intel is exact for scanned targets and a
//! hull-class estimate otherwise (see [`EnemyEstimate`]).

use combat_core::{
    CombatStateMachine, CombatStats, Combatant, CombatantId, DistanceBand, Faction,
    PersonalityProfile, TierProfile, compute_seed, rng::roll_context,
};

use crate::config::{AiConfig, ProfileCatalog};

/// What the deciding combatant believes about an enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyEstimate {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    /// Exact stats when scanned; tier-scaled hull-class stats otherwise.
    pub stats: CombatStats,
    pub hull: u32,
    pub shields: u32,
    pub lane: u8,
    pub band: DistanceBand,
    pub distance_km: u32,
    /// True when the numbers come from a scan.
    pub exact: bool,
}

impl EnemyEstimate {
    pub fn hull_fraction(&self) -> f32 {
        fraction(self.hull, self.stats.max_hull)
    }

    pub fn effective_hp(&self) -> u32 {
        self.hull + self.shields
    }
}

pub(crate) fn fraction(value: u32, max: u32) -> f32 {
    if max == 0 {
        0.0
    } else {
        value as f32 / max as f32
    }
}

/// Read-only planning context for one combatant's turn.
///
/// The `'a` lifetime ties the context to the state machine borrow taken for
/// the duration of planning; planning is synchronous.
pub struct AiContext<'a> {
    pub machine: &'a CombatStateMachine,
    pub actor: CombatantId,
    pub me: &'a Combatant,
    pub stats: CombatStats,
    /// Base personality weights before situational adjustment.
    pub personality: PersonalityProfile,
    pub tier: TierProfile,
    pub config: &'a AiConfig,
}

impl<'a> AiContext<'a> {
    /// Returns `None` when `actor` is not part of the roster.
    pub fn new(
        machine: &'a CombatStateMachine,
        actor: CombatantId,
        config: &'a AiConfig,
        profiles: &ProfileCatalog,
    ) -> Option<Self> {
        let me = machine.combatant(actor)?;
        Some(Self {
            machine,
            actor,
            me,
            stats: me.ship.combat_stats(),
            personality: profiles.personality(me.personality.unwrap_or_default()),
            tier: profiles.tier(me.experience.unwrap_or_default()),
            config,
        })
    }

    pub fn round(&self) -> u32 {
        self.machine.round()
    }

    pub fn hull(&self) -> u32 {
        self.me.ship.current_hull()
    }

    pub fn shields(&self) -> u32 {
        self.me.ship.current_shields()
    }

    pub fn hull_fraction(&self) -> f32 {
        self.me.ship.hull_fraction()
    }

    pub fn shield_fraction(&self) -> f32 {
        self.me.ship.shield_fraction()
    }

    pub fn lane(&self) -> u8 {
        self.machine.positions().lane(self.actor)
    }

    pub fn at_retreat_edge(&self) -> bool {
        self.machine.positions().at_retreat_edge(self.actor)
    }

    /// Active enemies in id order.
    pub fn enemies(&self) -> Vec<EnemyEstimate> {
        self.machine
            .enemies_of(self.actor)
            .into_iter()
            .filter_map(|id| self.estimate(id))
            .collect()
    }

    /// Active allies, excluding the actor.
    pub fn allies(&self) -> Vec<&'a Combatant> {
        self.machine
            .allies_of(self.actor)
            .into_iter()
            .filter_map(|id| self.machine.combatant(id))
            .collect()
    }

    pub fn estimate(&self, id: CombatantId) -> Option<EnemyEstimate> {
        let target = self.machine.combatant(id)?;
        let positions = self.machine.positions();
        let exact = self.me.has_scanned(id);

        let (stats, hull, shields) = if exact {
            (
                target.ship.combat_stats(),
                target.ship.current_hull(),
                target.ship.current_shields(),
            )
        } else {
            let mut stats = target.ship.hull_class().nominal_stats();
            if let Some(tier) = target.experience {
                let tier = tier.profile();
                stats.max_hull = scale(stats.max_hull, tier.hull_multiplier);
                stats.max_shields = scale(stats.max_shields, tier.shield_multiplier);
                stats.attack_bonus += tier.hit_bonus;
                stats.evasion += tier.evasion_bonus;
            }
            // Meters are observable as fractions even without a scan.
            let hull = scale(stats.max_hull, target.ship.hull_fraction());
            let shields = scale(stats.max_shields, target.ship.shield_fraction());
            (stats, hull, shields)
        };

        Some(EnemyEstimate {
            id,
            name: target.name.clone(),
            faction: target.faction.clone(),
            stats,
            hull,
            shields,
            lane: positions.lane(id),
            band: positions.band(self.actor, id),
            distance_km: positions.distance(self.actor, id),
            exact,
        })
    }

    /// Target number the actor needs to hit `target`.
    pub fn tn_against(&self, target: &EnemyEstimate) -> i32 {
        if target.exact {
            return self.machine.target_number(self.actor, target.id);
        }
        let config = self.machine.config();
        config.base_tn + (config.sr_base - target.stats.signature_radius) + target.stats.evasion
    }

    /// Target number `attacker` needs to hit the actor.
    pub fn tn_for(&self, attacker: CombatantId) -> i32 {
        self.machine.target_number(attacker, self.actor)
    }

    /// Deterministic per-turn seed for mistakes and random picks.
    pub fn seed(&self, salt: u64) -> u64 {
        compute_seed(
            self.config.seed,
            (u64::from(self.round()) << 16) | salt,
            self.actor.value(),
            roll_context::AI_NOISE,
        )
    }
}

fn scale(value: u32, factor: f32) -> u32 {
    (value as f32 * factor).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;

    #[test]
    fn unscanned_enemy_uses_class_estimate() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();

        let enemy = ctx.estimate(CombatantId(2)).unwrap();
        assert!(!enemy.exact);
        let nominal = machine
            .combatant(CombatantId(2))
            .unwrap()
            .ship
            .hull_class()
            .nominal_stats();
        assert_eq!(enemy.stats.max_hull, nominal.max_hull);
        assert_eq!(enemy.hull, nominal.max_hull);
    }

    #[test]
    fn scanned_enemy_is_exact() {
        let mut machine = skirmish(&[("Navy", 100), ("Pirates", 40)]);
        machine.record_scan(CombatantId(1), CombatantId(2));
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();

        let enemy = ctx.estimate(CombatantId(2)).unwrap();
        assert!(enemy.exact);
        assert_eq!(enemy.hull, 40);
        assert_eq!(ctx.tn_against(&enemy), machine.target_number(CombatantId(1), CombatantId(2)));
    }
}
