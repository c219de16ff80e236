//! Multi-turn weapon projection (planning step 3).
//!
//! For each weapon/target pair the actor is walked toward the weapon's
//! optimal band, up to two lane steps per turn, for `projection_horizon`
//! turns. The target is assumed to hold its lane. Each projected turn adds
//! the expected volley at the band reached and the target's expected return
//! fire; `net_value` weighs the two by risk tolerance.

use std::ops::RangeInclusive;

use combat_core::{CombatantId, DistanceBand};

use super::context::{AiContext, EnemyEstimate};
use super::threat::{self, ThreatProfile};

/// Lane steps the planner takes per turn (movement plus final movement).
const STEPS_PER_TURN: u32 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct WeaponProjection {
    pub target: CombatantId,
    pub weapon_index: usize,
    pub weapon: String,
    pub optimal_band: DistanceBand,
    /// Turns until the optimal band is reached; `Some(0)` when already there.
    pub turns_to_optimal: Option<u32>,
    pub damage: f32,
    pub incoming: f32,
    pub net_value: f32,
}

/// Projects every weapon against every enemy, best first.
pub fn project_all(
    ctx: &AiContext<'_>,
    enemies: &[EnemyEstimate],
    threats: &[ThreatProfile],
    risk_tolerance: f32,
) -> Vec<WeaponProjection> {
    let mut projections: Vec<WeaponProjection> = enemies
        .iter()
        .zip(threats)
        .flat_map(|(enemy, threat)| {
            (0..ctx.stats.weapons.len())
                .filter_map(move |i| project_weapon(ctx, enemy, threat, i, risk_tolerance))
        })
        .collect();
    projections.sort_by(|a, b| {
        b.net_value
            .total_cmp(&a.net_value)
            .then(a.target.cmp(&b.target))
            .then(a.weapon_index.cmp(&b.weapon_index))
    });
    projections
}

pub fn project_weapon(
    ctx: &AiContext<'_>,
    target: &EnemyEstimate,
    threat: &ThreatProfile,
    weapon_index: usize,
    risk_tolerance: f32,
) -> Option<WeaponProjection> {
    let weapon = ctx.stats.weapons.get(weapon_index)?;
    let optimal = weapon.optimal_band()?;
    let positions = ctx.machine.positions();
    let legal = positions
        .side(ctx.actor)
        .map(|side| positions.legal_lanes(side))
        .unwrap_or(0..=ctx.machine.config().max_lane());
    let band_at = |lane: u8| {
        positions.band_for_distance(positions.distance_between_lanes(lane, target.lane))
    };
    let tn = ctx.tn_against(target);
    let steps = ctx.stats.speed.min(STEPS_PER_TURN);

    let mut lane = ctx.lane();
    let mut turns_to_optimal = (band_at(lane) == optimal).then_some(0);
    let mut damage = 0.0;
    let mut incoming = 0.0;

    for turn in 1..=ctx.config.projection_horizon {
        for _ in 0..steps {
            let band = band_at(lane);
            if band == optimal {
                break;
            }
            let next = step_lane(lane, target.lane, band > optimal, &legal);
            if next == lane {
                break;
            }
            lane = next;
        }
        let band = band_at(lane);
        if turns_to_optimal.is_none() && band == optimal {
            turns_to_optimal = Some(turn);
        }
        damage += threat::expected_volley(weapon, band, ctx.stats.attack_bonus, tn);
        incoming += threat.output_by_band[band.index()];
    }

    Some(WeaponProjection {
        target: target.id,
        weapon_index,
        weapon: weapon.name.clone(),
        optimal_band: optimal,
        turns_to_optimal,
        damage,
        incoming,
        net_value: damage - (1.0 - risk_tolerance) * incoming,
    })
}

fn step_lane(lane: u8, target_lane: u8, closer: bool, legal: &RangeInclusive<u8>) -> u8 {
    let toward_higher = target_lane > lane;
    let next = match (closer, toward_higher) {
        (true, true) | (false, false) => lane.saturating_add(1),
        (true, false) | (false, true) => lane.saturating_sub(1),
    };
    if lane == target_lane && closer {
        return lane;
    }
    next.clamp(*legal.start(), *legal.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use crate::config::{AiConfig, ProfileCatalog};

    #[test]
    fn in_band_weapon_needs_no_travel() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();
        let enemy = ctx.estimate(CombatantId(2)).unwrap();
        let threat = threat::assess(&ctx, &enemy);

        // Lanes 2 and 7: 500 km, LONG, the railgun's optimal band.
        let railgun = project_weapon(&ctx, &enemy, &threat, 0, 0.5).unwrap();
        assert_eq!(railgun.optimal_band, DistanceBand::Long);
        assert_eq!(railgun.turns_to_optimal, Some(0));
        assert!(railgun.damage > 0.0);

        let torpedo = project_weapon(&ctx, &enemy, &threat, 1, 0.5).unwrap();
        assert_eq!(torpedo.optimal_band, DistanceBand::Medium);
        assert_eq!(torpedo.turns_to_optimal, Some(1));
    }

    #[test]
    fn projections_are_sorted_best_first() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100), ("Pirates", 100)]);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();
        let enemies = ctx.enemies();
        let threats: Vec<_> = enemies.iter().map(|e| threat::assess(&ctx, e)).collect();

        let all = project_all(&ctx, &enemies, &threats, 0.5);
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].net_value >= w[1].net_value));
    }

    #[test]
    fn steps_respect_side_bounds() {
        assert_eq!(step_lane(4, 7, true, &(0..=4)), 4);
        assert_eq!(step_lane(0, 7, false, &(0..=4)), 0);
        assert_eq!(step_lane(2, 7, true, &(0..=4)), 3);
        assert_eq!(step_lane(2, 7, false, &(0..=4)), 1);
    }
}
