//! Ship collaborator contract.
//!
//! The combat engine never inspects loadouts directly. Everything it needs
//! from a ship goes through [`ShipSystems`]: a stat snapshot, the dice
//! (initiative, to-hit, damage), the mutable hull and shield meters, and an
//! explicit [`Capabilities`] set computed once from the installed components.
//!
//! [`StandardShip`] is the reference implementation used by scenarios and tests.

mod standard;
mod weapon;

pub use standard::{ShipSpec, StandardShip};
pub use weapon::{DamageDice, DamageType, Weapon};

use crate::positioning::DistanceBand;

// ============================================================================
// Capabilities
// ============================================================================

bitflags::bitflags! {
    /// Capability set derived from installed components.
    ///
    /// Queried by the action registry to decide which actions a ship can
    /// attempt at all, independent of budget or cooldown.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Capabilities: u8 {
        const WEAPONS       = 1 << 0;
        const PROPULSION    = 1 << 1;
        const SENSORS       = 1 << 2;
        const SHIELDS       = 1 << 3;
        const POINT_DEFENSE = 1 << 4;
    }
}

/// Installed component categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    Weapon,
    Engine,
    Sensor,
    ShieldGenerator,
    PointDefense,
    Armor,
}

impl ComponentKind {
    pub const fn capability(self) -> Capabilities {
        match self {
            Self::Weapon => Capabilities::WEAPONS,
            Self::Engine => Capabilities::PROPULSION,
            Self::Sensor => Capabilities::SENSORS,
            Self::ShieldGenerator => Capabilities::SHIELDS,
            Self::PointDefense => Capabilities::POINT_DEFENSE,
            Self::Armor => Capabilities::empty(),
        }
    }
}

impl Capabilities {
    /// Folds a component list into a capability set.
    pub fn from_components<'a, I>(components: I) -> Self
    where
        I: IntoIterator<Item = &'a ComponentKind>,
    {
        components
            .into_iter()
            .fold(Capabilities::empty(), |caps, c| caps | c.capability())
    }
}

// ============================================================================
// Hull classes
// ============================================================================

/// Broad hull category. Used for unscanned estimates of an enemy's stats.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HullClass {
    Corvette,
    #[default]
    Frigate,
    Destroyer,
    Cruiser,
    Battleship,
}

impl HullClass {
    /// Nominal stat profile for the class, with a single representative weapon.
    pub fn nominal_stats(self) -> CombatStats {
        let (hull, shields, speed, evasion, sr, armor, attack, dice, band) = match self {
            Self::Corvette => (40, 20, 4, 2, 6, 0, 2, DamageDice::new(1, 6, 1), DistanceBand::Close),
            Self::Frigate => (70, 40, 3, 1, 9, 1, 1, DamageDice::new(2, 6, 0), DistanceBand::Medium),
            Self::Destroyer => (100, 60, 3, 0, 12, 2, 1, DamageDice::new(2, 8, 1), DistanceBand::Medium),
            Self::Cruiser => (160, 90, 2, 0, 16, 3, 2, DamageDice::new(3, 8, 0), DistanceBand::Long),
            Self::Battleship => (260, 140, 1, -1, 22, 4, 3, DamageDice::new(4, 10, 0), DistanceBand::Long),
        };
        CombatStats {
            max_hull: hull,
            max_shields: shields,
            speed,
            evasion,
            attack_bonus: attack,
            signature_radius: sr,
            initiative: 0,
            sensor_range: 500,
            armor,
            weapons: vec![Weapon::centered_on(format!("{self} battery"), dice, band)],
        }
    }
}

// ============================================================================
// Stats and rolls
// ============================================================================

/// Stat snapshot produced by the ship subsystem.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub max_hull: u32,
    pub max_shields: u32,
    /// Movement points granted per turn.
    pub speed: u32,
    pub evasion: i32,
    pub attack_bonus: i32,
    pub signature_radius: i32,
    pub initiative: i32,
    pub sensor_range: u32,
    pub armor: u32,
    pub weapons: Vec<Weapon>,
}

/// Situational inputs the engine supplies to a to-hit roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackContext {
    pub base_tn: i32,
    pub sr_base: i32,
    /// Defender's evasion stat plus any evasion-granting status effects.
    pub defender_evasion: i32,
    /// Attacker-side status modifiers (target lock, sensor jamming).
    pub attack_modifier: i32,
}

impl AttackContext {
    /// `BASE_TN + (SR_BASE - defender SR) + defender evasion`.
    pub fn target_number(&self, defender_sr: i32) -> i32 {
        self.base_tn + (self.sr_base - defender_sr) + self.defender_evasion
    }
}

/// Labelled term of an attack total.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollModifier {
    pub label: String,
    pub value: i32,
}

impl RollModifier {
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Resolved to-hit roll.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackRoll {
    /// Natural d20 result.
    pub roll: u32,
    pub total: i32,
    pub target_tn: i32,
    pub hit: bool,
    pub crit: bool,
    pub modifiers: Vec<RollModifier>,
}

/// Resolved damage roll for one volley.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRoll {
    pub damage: u32,
    pub damage_type: DamageType,
}

/// Weapon cannot be fired in the requested band.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{weapon} has no firing solution at {band} range")]
pub struct OutOfBand {
    pub weapon: String,
    pub band: DistanceBand,
}

/// Contract between the combat engine and the ship/loadout subsystem.
///
/// Meters (`current_hull`, `current_shields`) are owned by the ship but only
/// written by the combat state machine.
pub trait ShipSystems: Send + Sync + core::fmt::Debug {
    fn combat_stats(&self) -> CombatStats;

    fn hull_class(&self) -> HullClass;

    fn capabilities(&self) -> Capabilities;

    /// Rolls initiative (d20 + initiative stat).
    fn roll_initiative(&mut self) -> i32;

    /// Rolls to hit. Errors when the weapon has no modifier for `band`.
    fn roll_attack(
        &mut self,
        target_signature_radius: i32,
        weapon: &Weapon,
        band: DistanceBand,
        ctx: &AttackContext,
    ) -> Result<AttackRoll, OutOfBand>;

    /// Rolls one volley of damage (every shot of the weapon's rate of fire).
    fn roll_damage(&mut self, weapon: &Weapon, crit: bool) -> DamageRoll;

    fn current_hull(&self) -> u32;

    fn set_current_hull(&mut self, value: u32);

    fn current_shields(&self) -> u32;

    fn set_current_shields(&mut self, value: u32);

    /// Hull fraction in `[0, 1]`.
    fn hull_fraction(&self) -> f32 {
        let max = self.combat_stats().max_hull;
        if max == 0 {
            0.0
        } else {
            self.current_hull() as f32 / max as f32
        }
    }

    /// Shield fraction in `[0, 1]`. Ships without shields report 0.
    fn shield_fraction(&self) -> f32 {
        let max = self.combat_stats().max_shields;
        if max == 0 {
            0.0
        } else {
            self.current_shields() as f32 / max as f32
        }
    }
}
