use crate::positioning::DistanceBand;

/// Named personality presets.
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
pub enum PersonalityKind {
    Aggressive,
    Cautious,
    #[default]
    Balanced,
    Sniper,
    Berserker,
    Diplomat,
    Coward,
}

/// Weighted behavioural bias.
///
/// Weights are multipliers around 1.0; thresholds are fractions in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersonalityProfile {
    pub attack: f32,
    pub retreat: f32,
    pub close_distance: f32,
    pub keep_distance: f32,
    pub evasive: f32,
    pub negotiate: f32,
    /// Hull fraction below which retreat is considered.
    pub retreat_hp_pct: f32,
    /// Willingness to accept incoming damage for outgoing damage.
    pub risk_tolerance: f32,
    pub preferred_band: DistanceBand,
    pub aggression: f32,
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        PersonalityKind::Balanced.profile()
    }
}

impl PersonalityKind {
    /// Built-in preset for this personality.
    pub fn profile(self) -> PersonalityProfile {
        let (attack, retreat, close, keep, evasive, negotiate, retreat_hp, risk, band, aggression) =
            match self {
                Self::Aggressive => (1.5, 0.5, 1.4, 0.6, 0.7, 0.5, 0.15, 0.8, DistanceBand::Close, 0.85),
                Self::Cautious => (0.9, 1.3, 0.7, 1.3, 1.4, 1.2, 0.40, 0.3, DistanceBand::Long, 0.35),
                Self::Balanced => (1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.25, 0.5, DistanceBand::Medium, 0.5),
                Self::Sniper => (1.2, 1.0, 0.5, 1.6, 1.1, 0.8, 0.30, 0.45, DistanceBand::Long, 0.6),
                Self::Berserker => (2.0, 0.1, 1.8, 0.3, 0.3, 0.2, 0.0, 1.0, DistanceBand::PointBlank, 1.0),
                Self::Diplomat => (0.7, 1.1, 0.8, 1.1, 1.1, 1.8, 0.35, 0.4, DistanceBand::Medium, 0.3),
                Self::Coward => (0.6, 1.8, 0.4, 1.7, 1.6, 1.4, 0.60, 0.15, DistanceBand::Extreme, 0.15),
            };
        PersonalityProfile {
            attack,
            retreat,
            close_distance: close,
            keep_distance: keep,
            evasive,
            negotiate,
            retreat_hp_pct: retreat_hp,
            risk_tolerance: risk,
            preferred_band: band,
            aggression,
        }
    }
}

/// Decision-time circumstances that bend the base weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SituationalFactors {
    pub hull_fraction: f32,
    pub outnumbered: bool,
    pub has_advantage: bool,
    pub at_retreat_edge: bool,
}

/// Modifier applied by [`PersonalityProfile::adjusted`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SituationalModifier {
    Outnumbered,
    Advantage,
    Enraged,
    Cornered,
}

impl PersonalityProfile {
    /// Returns the profile adjusted for the current situation, plus the
    /// modifiers that fired.
    pub fn adjusted(&self, factors: &SituationalFactors) -> (PersonalityProfile, Vec<SituationalModifier>) {
        let mut p = self.clone();
        let mut applied = Vec::new();

        if factors.outnumbered {
            p.retreat *= 1.3;
            p.negotiate *= 1.2;
            p.attack *= 0.9;
            applied.push(SituationalModifier::Outnumbered);
        }
        if factors.has_advantage {
            p.attack *= 1.2;
            p.close_distance *= 1.1;
            p.retreat *= 0.8;
            applied.push(SituationalModifier::Advantage);
        }
        if factors.hull_fraction < 0.3 && self.aggression >= 0.7 {
            p.attack *= 1.5;
            p.retreat *= 0.5;
            p.risk_tolerance = (p.risk_tolerance + 0.2).min(1.0);
            applied.push(SituationalModifier::Enraged);
        }
        if factors.at_retreat_edge && factors.hull_fraction < self.retreat_hp_pct {
            p.attack *= 1.4;
            p.evasive *= 1.2;
            p.retreat *= 0.5;
            applied.push(SituationalModifier::Cornered);
        }

        (p, applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> SituationalFactors {
        SituationalFactors {
            hull_fraction: 1.0,
            outnumbered: false,
            has_advantage: false,
            at_retreat_edge: false,
        }
    }

    #[test]
    fn calm_situation_leaves_profile_untouched() {
        let base = PersonalityKind::Cautious.profile();
        let (adjusted, applied) = base.adjusted(&calm());
        assert_eq!(adjusted, base);
        assert!(applied.is_empty());
    }

    #[test]
    fn low_hull_enrages_aggressive_profiles_only() {
        let factors = SituationalFactors {
            hull_fraction: 0.2,
            ..calm()
        };
        let (berserker, applied) = PersonalityKind::Berserker.profile().adjusted(&factors);
        assert!(applied.contains(&SituationalModifier::Enraged));
        assert!(berserker.attack > PersonalityKind::Berserker.profile().attack);

        let (_, applied) = PersonalityKind::Cautious.profile().adjusted(&factors);
        assert!(!applied.contains(&SituationalModifier::Enraged));
    }

    #[test]
    fn outnumbered_raises_retreat_weight() {
        let base = PersonalityKind::Balanced.profile();
        let (adjusted, _) = base.adjusted(&SituationalFactors {
            outnumbered: true,
            ..calm()
        });
        assert!(adjusted.retreat > base.retreat);
        assert!(adjusted.attack < base.attack);
    }

    #[test]
    fn cornered_requires_edge_and_low_hull() {
        let base = PersonalityKind::Coward.profile();
        let (_, applied) = base.adjusted(&SituationalFactors {
            hull_fraction: 0.3,
            at_retreat_edge: true,
            ..calm()
        });
        assert_eq!(applied, vec![SituationalModifier::Cornered]);
    }
}
