//! Expected-damage and threat scoring.
//!
//! All figures are expectations per volley: average damage x hit chance x
//! (1 + crit chance). Nothing here rolls dice.

use combat_core::{CombatStats, CombatantId, DistanceBand, Weapon, hit_probability};

use super::context::{AiContext, EnemyEstimate};

/// Expected damage of one volley of `weapon` in `band`; zero out of band.
pub fn expected_volley(weapon: &Weapon, band: DistanceBand, attack_bonus: i32, target_tn: i32) -> f32 {
    let Some(modifier) = weapon.band_modifier(band) else {
        return 0.0;
    };
    let p = hit_probability(attack_bonus + weapon.attack_bonus + modifier, target_tn);
    weapon.average_volley() * p * (1.0 + weapon.crit_chance())
}

/// Best weapon in `band` by expected damage, as `(index, expected)`.
pub fn best_weapon(stats: &CombatStats, band: DistanceBand, target_tn: i32) -> Option<(usize, f32)> {
    stats
        .weapons
        .iter()
        .enumerate()
        .map(|(i, w)| (i, expected_volley(w, band, stats.attack_bonus, target_tn)))
        .filter(|(_, dmg)| *dmg > 0.0)
        .fold(None, |best, (i, dmg)| match best {
            Some((_, best_dmg)) if best_dmg >= dmg => best,
            _ => Some((i, dmg)),
        })
}

pub fn best_output(stats: &CombatStats, band: DistanceBand, target_tn: i32) -> f32 {
    best_weapon(stats, band, target_tn).map_or(0.0, |(_, dmg)| dmg)
}

/// Effective hit points: hull plus shields, stretched by armor and shrunk by
/// a large signature.
pub fn defensive_strength(stats: &CombatStats, hull: u32, shields: u32, sr_base: i32) -> f32 {
    let pool = (hull + shields) as f32;
    let armor = 1.0 + stats.armor as f32 * 0.1;
    let signature = sr_base.max(1) as f32 / stats.signature_radius.max(1) as f32;
    pool * armor * signature.clamp(0.5, 2.0)
}

/// Positive when `mine` out-moves `theirs`.
pub fn mobility_differential(mine: &CombatStats, theirs: &CombatStats) -> i32 {
    (mine.speed as i32 - theirs.speed as i32) + (mine.evasion - theirs.evasion)
}

/// Closer bands weigh more: x2.0 at POINT_BLANK down to x1.0 at EXTREME.
pub fn proximity_weight(band: DistanceBand) -> f32 {
    1.0 + (DistanceBand::Extreme.index() - band.index()) as f32 * 0.25
}

/// Combat value used for force ratios: pool x (1 + tenth of raw weapon output).
pub fn combat_value(stats: &CombatStats, hull: u32, shields: u32) -> f32 {
    let firepower: f32 = stats.weapons.iter().map(Weapon::average_volley).sum();
    (hull + shields) as f32 * (1.0 + firepower / 10.0)
}

/// Danger an enemy poses to the deciding combatant.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreatProfile {
    pub id: CombatantId,
    pub band: DistanceBand,
    /// Their best expected volley against us, per band.
    pub output_by_band: [f32; DistanceBand::COUNT],
    pub defense: f32,
    pub mobility: i32,
    pub overall: f32,
}

impl ThreatProfile {
    pub fn current_output(&self) -> f32 {
        self.output_by_band[self.band.index()]
    }

    pub fn peak_output(&self) -> f32 {
        self.output_by_band.iter().copied().fold(0.0, f32::max)
    }
}

pub fn assess(ctx: &AiContext<'_>, enemy: &EnemyEstimate) -> ThreatProfile {
    let tn = ctx.tn_for(enemy.id);
    let output_by_band = DistanceBand::ALL.map(|band| best_output(&enemy.stats, band, tn));
    let defense = defensive_strength(
        &enemy.stats,
        enemy.hull,
        enemy.shields,
        ctx.machine.config().sr_base,
    );

    let mut profile = ThreatProfile {
        id: enemy.id,
        band: enemy.band,
        output_by_band,
        defense,
        mobility: mobility_differential(&enemy.stats, &ctx.stats),
        overall: 0.0,
    };
    profile.overall = profile.current_output() * proximity_weight(enemy.band)
        + 0.25 * profile.peak_output()
        + profile.mobility.max(0) as f32 * 0.5;
    profile
}

/// Expected damage per round from every listed threat at its current band.
pub fn incoming_estimate(threats: &[ThreatProfile]) -> f32 {
    threats.iter().map(ThreatProfile::current_output).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::DamageDice;

    fn cannon() -> Weapon {
        Weapon::centered_on("cannon", DamageDice::new(2, 6, 0), DistanceBand::Medium)
    }

    #[test]
    fn out_of_band_expects_nothing() {
        let gun = cannon().with_band_modifier(DistanceBand::Extreme, None);
        assert_eq!(expected_volley(&gun, DistanceBand::Extreme, 5, 10), 0.0);
    }

    #[test]
    fn easier_target_expects_more() {
        let gun = cannon();
        let hard = expected_volley(&gun, DistanceBand::Medium, 0, 18);
        let easy = expected_volley(&gun, DistanceBand::Medium, 0, 8);
        assert!(easy > hard);
        assert!(easy <= gun.average_volley() * (1.0 + gun.crit_chance()));
    }

    #[test]
    fn proximity_weights_close_bands() {
        assert_eq!(proximity_weight(DistanceBand::Extreme), 1.0);
        assert_eq!(proximity_weight(DistanceBand::PointBlank), 2.0);
    }

    #[test]
    fn armor_raises_defense() {
        let mut stats = combat_core::HullClass::Frigate.nominal_stats();
        let bare = defensive_strength(&stats, 50, 20, 10);
        stats.armor += 5;
        assert!(defensive_strength(&stats, 50, 20, 10) > bare);
    }
}
