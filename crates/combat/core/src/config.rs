use crate::error::{CombatError, ErrorSeverity};

/// Combat configuration constants and tunable parameters.
///
/// Every tunable rule parameter lives here so that scenarios and tests can
/// adjust balance without touching rule code. The defaults reproduce the
/// canonical lane layout (ten lanes, 100 km apart, near side 0-4, far side 5-9).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Number of lanes in the engagement line (lanes are `0..lane_count`).
    pub lane_count: u8,
    /// Distance in kilometres between two adjacent lanes.
    pub km_per_lane: u32,
    /// Highest lane index the near side may occupy. The far side starts at
    /// `near_side_max + 1`.
    pub near_side_max: u8,
    /// Starting lane for near-side combatants.
    pub near_start_lane: u8,
    /// Starting lane for far-side combatants.
    pub far_start_lane: u8,
    /// Inclusive upper bounds (km) for the distance bands.
    pub bands: BandBounds,
    /// Base target number before signature radius adjustments.
    pub base_tn: i32,
    /// Reference signature radius. Ships smaller than this are harder to hit.
    pub sr_base: i32,
    /// Per-turn action economy granted at the start of each turn.
    pub budget: BudgetGrant,
    /// Movement points consumed by a single lane step.
    pub lane_step_cost: u32,
    /// Maximum number of reactions a single reaction window accepts.
    pub max_reactions_per_window: usize,
    /// Magnitudes used by the built-in action effects.
    pub effects: EffectTuning,
    /// Oldest log entries are dropped beyond this many. `None` keeps everything.
    pub log_capacity: Option<usize>,
}

/// Inclusive upper bounds (km) of each distance band. Anything beyond
/// `long_max` is EXTREME, so the table has no gaps by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandBounds {
    pub point_blank_max: u32,
    pub close_max: u32,
    pub medium_max: u32,
    pub long_max: u32,
}

impl Default for BandBounds {
    fn default() -> Self {
        Self {
            point_blank_max: 100,
            close_max: 250,
            medium_max: 450,
            long_max: 700,
        }
    }
}

/// Action economy granted to a combatant when its turn starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BudgetGrant {
    pub actions: u32,
    pub bonus_actions: u32,
    pub reactions: u32,
}

impl Default for BudgetGrant {
    fn default() -> Self {
        Self {
            actions: 1,
            bonus_actions: 1,
            reactions: 1,
        }
    }
}

/// Numeric payloads of the catalogue effects.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTuning {
    /// Evasion granted by the `Evade` main action.
    pub evade_bonus: i32,
    /// Evasion granted by the `EvasiveManeuvers` reaction.
    pub evasive_reaction_bonus: i32,
    /// Fraction of max shields restored by `BoostShields`.
    pub shield_boost_fraction: f32,
    /// Fraction of max shields granted as a temporary pool by `EmergencyShields`.
    pub emergency_shield_fraction: f32,
    /// Attack bonus granted by `TargetLock` against the locked target.
    pub target_lock_bonus: i32,
    /// Attack penalty applied by `JamSensors`.
    pub jam_penalty: i32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            evade_bonus: 3,
            evasive_reaction_bonus: 4,
            shield_boost_fraction: 0.2,
            emergency_shield_fraction: 0.25,
            target_lock_bonus: 2,
            jam_penalty: 2,
        }
    }
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum concurrent status effects per combatant.
    pub const MAX_STATUS_EFFECTS: usize = 8;
    /// Maximum combatants in one engagement.
    pub const MAX_COMBATANTS: usize = 64;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_LANE_COUNT: u8 = 10;
    pub const DEFAULT_KM_PER_LANE: u32 = 100;
    pub const DEFAULT_BASE_TN: i32 = 10;
    pub const DEFAULT_SR_BASE: i32 = 10;

    pub fn new() -> Self {
        Self {
            lane_count: Self::DEFAULT_LANE_COUNT,
            km_per_lane: Self::DEFAULT_KM_PER_LANE,
            near_side_max: 4,
            near_start_lane: 2,
            far_start_lane: 7,
            bands: BandBounds::default(),
            base_tn: Self::DEFAULT_BASE_TN,
            sr_base: Self::DEFAULT_SR_BASE,
            budget: BudgetGrant::default(),
            lane_step_cost: 1,
            max_reactions_per_window: 3,
            effects: EffectTuning::default(),
            log_capacity: None,
        }
    }

    /// Highest valid lane index.
    pub fn max_lane(&self) -> u8 {
        self.lane_count.saturating_sub(1)
    }

    /// Checks that both sides own at least one lane and the band table is ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if u16::from(self.near_side_max) + 1 >= u16::from(self.lane_count) {
            return Err(ConfigError::InvalidLanes {
                lane_count: self.lane_count,
                near_side_max: self.near_side_max,
            });
        }
        if self.km_per_lane == 0 {
            return Err(ConfigError::ZeroLaneSpacing);
        }
        let b = &self.bands;
        if !(b.point_blank_max < b.close_max && b.close_max < b.medium_max && b.medium_max < b.long_max) {
            return Err(ConfigError::UnorderedBands);
        }
        Ok(())
    }

    /// Largest distance representable on the lane line.
    pub fn max_distance(&self) -> u32 {
        u32::from(self.max_lane()) * self.km_per_lane
    }
}

/// Rejected [`CombatConfig`] geometry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("lane_count {lane_count} leaves no lanes for both sides (near_side_max {near_side_max})")]
    InvalidLanes { lane_count: u8, near_side_max: u8 },

    #[error("km_per_lane must be positive")]
    ZeroLaneSpacing,

    #[error("band bounds must be strictly increasing")]
    UnorderedBands,
}

impl CombatError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLanes { .. } => "CONFIG_INVALID_LANES",
            Self::ZeroLaneSpacing => "CONFIG_ZERO_LANE_SPACING",
            Self::UnorderedBands => "CONFIG_UNORDERED_BANDS",
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
