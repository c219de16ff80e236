/// Target priority strategy used by the AI.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetStrategy {
    Random,
    Weakest,
    #[default]
    Closest,
    Strongest,
    /// Threat-to-defense ratio.
    Tactical,
    /// Multi-factor: threat, vulnerability, "can I hit them", "can they hit me".
    Optimal,
}

/// Five ordered experience tiers, unskilled to elite.
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
pub enum ExperienceTier {
    Green,
    #[default]
    Regular,
    Seasoned,
    Veteran,
    Elite,
}

/// Stat multipliers and AI-quality knobs for one tier.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierProfile {
    pub hit_bonus: i32,
    pub evasion_bonus: i32,
    pub hull_multiplier: f32,
    pub shield_multiplier: f32,
    /// Probability that the AI discards its best choice for a worse one.
    pub mistake_chance: f32,
    pub target_strategy: TargetStrategy,
    pub advanced_tactics: bool,
    pub prediction: bool,
}

impl Default for TierProfile {
    fn default() -> Self {
        ExperienceTier::Regular.profile()
    }
}

impl ExperienceTier {
    pub const ALL: [ExperienceTier; 5] = [
        Self::Green,
        Self::Regular,
        Self::Seasoned,
        Self::Veteran,
        Self::Elite,
    ];

    pub fn profile(self) -> TierProfile {
        let (hit, evasion, hull, shield, mistake, strategy, advanced, prediction) = match self {
            Self::Green => (-1, -1, 0.9, 0.9, 0.25, TargetStrategy::Random, false, false),
            Self::Regular => (0, 0, 1.0, 1.0, 0.12, TargetStrategy::Closest, false, false),
            Self::Seasoned => (1, 0, 1.1, 1.1, 0.06, TargetStrategy::Weakest, true, false),
            Self::Veteran => (2, 1, 1.2, 1.2, 0.03, TargetStrategy::Tactical, true, true),
            Self::Elite => (3, 2, 1.35, 1.3, 0.0, TargetStrategy::Optimal, true, true),
        };
        TierProfile {
            hit_bonus: hit,
            evasion_bonus: evasion,
            hull_multiplier: hull,
            shield_multiplier: shield,
            mistake_chance: mistake,
            target_strategy: strategy,
            advanced_tactics: advanced,
            prediction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_improve_monotonically() {
        let profiles: Vec<_> = ExperienceTier::ALL.iter().map(|t| t.profile()).collect();
        for pair in profiles.windows(2) {
            assert!(pair[1].hit_bonus >= pair[0].hit_bonus);
            assert!(pair[1].hull_multiplier >= pair[0].hull_multiplier);
            assert!(pair[1].mistake_chance <= pair[0].mistake_chance);
        }
        assert!(ExperienceTier::Green < ExperienceTier::Elite);
    }

    #[test]
    fn tier_names_parse() {
        let tier: ExperienceTier = "veteran".parse().unwrap();
        assert_eq!(tier, ExperienceTier::Veteran);
        assert_eq!(tier.profile().target_strategy, TargetStrategy::Tactical);
    }
}
