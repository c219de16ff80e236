//! Weapon definitions and their range-band tables.

use crate::positioning::DistanceBand;

/// Damage category reported by a damage roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DamageType {
    #[default]
    Kinetic,
    Energy,
    Explosive,
}

/// `count`d`sides` + `bonus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageDice {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

impl DamageDice {
    pub const fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self {
            count,
            sides,
            bonus,
        }
    }

    /// Mean result of one roll.
    pub fn average(&self) -> f32 {
        let per_die = (self.sides as f32 + 1.0) / 2.0;
        (self.count as f32 * per_die + self.bonus as f32).max(0.0)
    }

    /// Highest possible result of one roll.
    pub fn maximum(&self) -> u32 {
        (self.count as i64 * self.sides as i64 + self.bonus as i64).max(0) as u32
    }
}

impl core::fmt::Display for DamageDice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.bonus {
            0 => write!(f, "{}d{}", self.count, self.sides),
            b if b > 0 => write!(f, "{}d{}+{}", self.count, self.sides, b),
            b => write!(f, "{}d{}{}", self.count, self.sides, b),
        }
    }
}

/// A ship-mounted weapon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weapon {
    pub name: String,
    pub dice: DamageDice,
    /// Shots per volley. Each shot rolls `dice` once.
    pub rate_of_fire: u32,
    pub attack_bonus: i32,
    /// Natural roll at or above which a hit is critical.
    pub crit_threshold: u32,
    /// Guided munitions can be intercepted by point defense.
    pub guided: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: DamageType,
    /// To-hit modifier per band, indexed by [`DistanceBand::index`].
    /// `None` means the weapon cannot fire in that band.
    pub band_modifiers: [Option<i32>; DistanceBand::COUNT],
}

impl Weapon {
    /// Weapon with a band table peaking at `optimal`: +1 there, 0 one band
    /// away, -2 two bands away, unusable beyond.
    pub fn centered_on(name: impl Into<String>, dice: DamageDice, optimal: DistanceBand) -> Self {
        let mut band_modifiers = [None; DistanceBand::COUNT];
        for band in DistanceBand::ALL {
            band_modifiers[band.index()] = match band.steps_to(optimal) {
                0 => Some(1),
                1 => Some(0),
                2 => Some(-2),
                _ => None,
            };
        }
        Self {
            name: name.into(),
            dice,
            rate_of_fire: 1,
            attack_bonus: 0,
            crit_threshold: 20,
            guided: false,
            damage_type: DamageType::Kinetic,
            band_modifiers,
        }
    }

    pub fn with_rate_of_fire(mut self, rate_of_fire: u32) -> Self {
        self.rate_of_fire = rate_of_fire.max(1);
        self
    }

    pub fn with_attack_bonus(mut self, bonus: i32) -> Self {
        self.attack_bonus = bonus;
        self
    }

    pub fn guided(mut self) -> Self {
        self.guided = true;
        self
    }

    pub fn with_band_modifier(mut self, band: DistanceBand, modifier: Option<i32>) -> Self {
        self.band_modifiers[band.index()] = modifier;
        self
    }

    pub fn band_modifier(&self, band: DistanceBand) -> Option<i32> {
        self.band_modifiers[band.index()]
    }

    pub fn can_fire_at(&self, band: DistanceBand) -> bool {
        self.band_modifier(band).is_some()
    }

    /// Band with the best modifier; ties resolve to the closer band.
    pub fn optimal_band(&self) -> Option<DistanceBand> {
        DistanceBand::ALL
            .into_iter()
            .filter_map(|band| self.band_modifier(band).map(|m| (band, m)))
            .fold(None, |best: Option<(DistanceBand, i32)>, (band, m)| match best {
                Some((_, best_m)) if best_m >= m => best,
                _ => Some((band, m)),
            })
            .map(|(band, _)| band)
    }

    /// Probability that a natural d20 roll is critical.
    pub fn crit_chance(&self) -> f32 {
        let threshold = self.crit_threshold.clamp(1, 21);
        (21 - threshold) as f32 / 20.0
    }

    /// Mean damage of one volley, ignoring hit chance.
    pub fn average_volley(&self) -> f32 {
        self.dice.average() * self.rate_of_fire.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_table_peaks_at_optimal_band() {
        let laser = Weapon::centered_on("laser", DamageDice::new(2, 6, 0), DistanceBand::Medium);
        assert_eq!(laser.band_modifier(DistanceBand::Medium), Some(1));
        assert_eq!(laser.band_modifier(DistanceBand::Long), Some(0));
        assert_eq!(laser.band_modifier(DistanceBand::PointBlank), Some(-2));
        assert_eq!(laser.optimal_band(), Some(DistanceBand::Medium));

        let cannon = Weapon::centered_on("cannon", DamageDice::new(1, 10, 0), DistanceBand::PointBlank);
        assert!(!cannon.can_fire_at(DistanceBand::Long));
        assert!(!cannon.can_fire_at(DistanceBand::Extreme));
    }

    #[test]
    fn averages_account_for_rate_of_fire() {
        let gun = Weapon::centered_on("gun", DamageDice::new(2, 6, 1), DistanceBand::Close)
            .with_rate_of_fire(3);
        assert!((gun.dice.average() - 8.0).abs() < f32::EPSILON);
        assert!((gun.average_volley() - 24.0).abs() < f32::EPSILON);
        assert_eq!(gun.dice.to_string(), "2d6+1");
    }

    #[test]
    fn crit_chance_from_threshold() {
        let mut gun = Weapon::centered_on("gun", DamageDice::new(1, 6, 0), DistanceBand::Close);
        assert!((gun.crit_chance() - 0.05).abs() < 1e-6);
        gun.crit_threshold = 19;
        assert!((gun.crit_chance() - 0.10).abs() < 1e-6);
    }
}
