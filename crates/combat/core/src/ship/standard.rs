//! Reference ship built from a declarative spec.

use std::collections::VecDeque;

use super::{
    AttackContext, AttackRoll, Capabilities, CombatStats, ComponentKind, DamageRoll, HullClass,
    OutOfBand, RollModifier, ShipSystems, Weapon,
};
use crate::positioning::DistanceBand;
use crate::profile::TierProfile;
use crate::rng::{DiceStream, roll_context};

/// Declarative ship description, as found in scenario files.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipSpec {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hull_class: HullClass,
    pub max_hull: u32,
    pub max_shields: u32,
    pub speed: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub evasion: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attack_bonus: i32,
    pub signature_radius: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initiative: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sensor_range: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub armor: u32,
    pub weapons: Vec<Weapon>,
    pub components: Vec<ComponentKind>,
}

impl ShipSpec {
    /// Spec using the nominal profile of a hull class with a full component set.
    pub fn nominal(name: impl Into<String>, class: HullClass) -> Self {
        let stats = class.nominal_stats();
        Self {
            name: name.into(),
            hull_class: class,
            max_hull: stats.max_hull,
            max_shields: stats.max_shields,
            speed: stats.speed,
            evasion: stats.evasion,
            attack_bonus: stats.attack_bonus,
            signature_radius: stats.signature_radius,
            initiative: stats.initiative,
            sensor_range: stats.sensor_range,
            armor: stats.armor,
            weapons: stats.weapons,
            components: vec![
                ComponentKind::Weapon,
                ComponentKind::Engine,
                ComponentKind::Sensor,
                ComponentKind::ShieldGenerator,
            ],
        }
    }
}

/// [`ShipSystems`] implementation with seeded dice and a scripted roll queue.
///
/// Queued d20 results and queued volley totals are consumed before the
/// seeded generator, which makes scenario tests exact.
#[derive(Clone, Debug)]
pub struct StandardShip {
    name: String,
    class: HullClass,
    stats: CombatStats,
    capabilities: Capabilities,
    hull: u32,
    shields: u32,
    dice: DiceStream,
    scripted_d20: VecDeque<u32>,
    scripted_damage: VecDeque<u32>,
    fixed_initiative: Option<i32>,
}

impl StandardShip {
    pub fn from_spec(spec: ShipSpec, seed: u64) -> Self {
        let capabilities = Capabilities::from_components(&spec.components);
        let stream = spec
            .name
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let stats = CombatStats {
            max_hull: spec.max_hull,
            max_shields: spec.max_shields,
            speed: spec.speed,
            evasion: spec.evasion,
            attack_bonus: spec.attack_bonus,
            signature_radius: spec.signature_radius,
            initiative: spec.initiative,
            sensor_range: spec.sensor_range,
            armor: spec.armor,
            weapons: spec.weapons,
        };
        Self {
            name: spec.name,
            class: spec.hull_class,
            hull: stats.max_hull,
            shields: stats.max_shields,
            stats,
            capabilities,
            dice: DiceStream::new(seed, stream),
            scripted_d20: VecDeque::new(),
            scripted_damage: VecDeque::new(),
            fixed_initiative: None,
        }
    }

    /// Applies an experience tier's stat multipliers and bonuses.
    ///
    /// Meters are refilled to the new maxima.
    pub fn with_experience(mut self, tier: &TierProfile) -> Self {
        self.stats.max_hull = scale(self.stats.max_hull, tier.hull_multiplier);
        self.stats.max_shields = scale(self.stats.max_shields, tier.shield_multiplier);
        self.stats.attack_bonus += tier.hit_bonus;
        self.stats.evasion += tier.evasion_bonus;
        self.hull = self.stats.max_hull;
        self.shields = self.stats.max_shields;
        self
    }

    pub fn with_fixed_initiative(mut self, initiative: i32) -> Self {
        self.fixed_initiative = Some(initiative);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues natural d20 results for upcoming to-hit rolls.
    pub fn queue_d20<I: IntoIterator<Item = u32>>(&mut self, rolls: I) {
        self.scripted_d20
            .extend(rolls.into_iter().map(|r| r.clamp(1, 20)));
    }

    /// Queues volley totals for upcoming damage rolls.
    pub fn queue_damage<I: IntoIterator<Item = u32>>(&mut self, totals: I) {
        self.scripted_damage.extend(totals);
    }

    fn next_d20(&mut self) -> u32 {
        match self.scripted_d20.pop_front() {
            Some(roll) => roll,
            None => self.dice.d20(roll_context::TO_HIT),
        }
    }
}

fn scale(value: u32, multiplier: f32) -> u32 {
    (value as f32 * multiplier.max(0.0)).round() as u32
}

impl ShipSystems for StandardShip {
    fn combat_stats(&self) -> CombatStats {
        self.stats.clone()
    }

    fn hull_class(&self) -> HullClass {
        self.class
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn roll_initiative(&mut self) -> i32 {
        if let Some(fixed) = self.fixed_initiative {
            return fixed;
        }
        self.dice.d20(roll_context::INITIATIVE) as i32 + self.stats.initiative
    }

    fn roll_attack(
        &mut self,
        target_signature_radius: i32,
        weapon: &Weapon,
        band: DistanceBand,
        ctx: &AttackContext,
    ) -> Result<AttackRoll, OutOfBand> {
        let band_modifier = weapon.band_modifier(band).ok_or_else(|| OutOfBand {
            weapon: weapon.name.clone(),
            band,
        })?;

        let roll = self.next_d20();
        let mut modifiers = vec![
            RollModifier::new("attack bonus", self.stats.attack_bonus),
            RollModifier::new("weapon bonus", weapon.attack_bonus),
            RollModifier::new(format!("{} band", band.key()), band_modifier),
        ];
        if ctx.attack_modifier != 0 {
            modifiers.push(RollModifier::new("status", ctx.attack_modifier));
        }

        let total = roll as i32 + modifiers.iter().map(|m| m.value).sum::<i32>();
        let target_tn = ctx.target_number(target_signature_radius);
        let hit = total >= target_tn;
        let crit = hit && roll >= weapon.crit_threshold;

        Ok(AttackRoll {
            roll,
            total,
            target_tn,
            hit,
            crit,
            modifiers,
        })
    }

    fn roll_damage(&mut self, weapon: &Weapon, crit: bool) -> DamageRoll {
        if let Some(total) = self.scripted_damage.pop_front() {
            return DamageRoll {
                damage: total,
                damage_type: weapon.damage_type,
            };
        }

        let dice_per_shot = if crit {
            weapon.dice.count * 2
        } else {
            weapon.dice.count
        };
        let mut damage: i64 = 0;
        for _ in 0..weapon.rate_of_fire.max(1) {
            let mut shot: i64 = weapon.dice.bonus as i64;
            for _ in 0..dice_per_shot {
                shot += self.dice.die(roll_context::DAMAGE, weapon.dice.sides) as i64;
            }
            damage += shot.max(0);
        }

        DamageRoll {
            damage: damage.max(0) as u32,
            damage_type: weapon.damage_type,
        }
    }

    fn current_hull(&self) -> u32 {
        self.hull
    }

    fn set_current_hull(&mut self, value: u32) {
        self.hull = value.min(self.stats.max_hull);
    }

    fn current_shields(&self) -> u32 {
        self.shields
    }

    fn set_current_shields(&mut self, value: u32) {
        self.shields = value.min(self.stats.max_shields);
    }
}
