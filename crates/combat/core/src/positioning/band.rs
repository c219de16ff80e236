//! Distance bands derived from lane distance.

use crate::config::BandBounds;

/// Ordered range category derived from the distance between two combatants.
///
/// Bands are never stored; they are always recomputed from the current
/// distance with [`BandBounds::classify`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DistanceBand {
    PointBlank,
    Close,
    Medium,
    Long,
    Extreme,
}

impl DistanceBand {
    pub const COUNT: usize = 5;

    pub const ALL: [DistanceBand; Self::COUNT] = [
        Self::PointBlank,
        Self::Close,
        Self::Medium,
        Self::Long,
        Self::Extreme,
    ];

    /// Position of this band in the ordered enumeration (0 = POINT_BLANK).
    pub const fn index(self) -> usize {
        match self {
            Self::PointBlank => 0,
            Self::Close => 1,
            Self::Medium => 2,
            Self::Long => 3,
            Self::Extreme => 4,
        }
    }

    /// Band key used in logs and weapon tables (e.g. `"LONG"`).
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Number of band steps between two bands.
    pub fn steps_to(self, other: DistanceBand) -> usize {
        self.index().abs_diff(other.index())
    }
}

impl BandBounds {
    /// Classifies a distance in kilometres. Every distance maps to exactly one band.
    pub fn classify(&self, distance_km: u32) -> DistanceBand {
        if distance_km <= self.point_blank_max {
            DistanceBand::PointBlank
        } else if distance_km <= self.close_max {
            DistanceBand::Close
        } else if distance_km <= self.medium_max {
            DistanceBand::Medium
        } else if distance_km <= self.long_max {
            DistanceBand::Long
        } else {
            DistanceBand::Extreme
        }
    }

    /// Inclusive km range covered by a band. EXTREME is open-ended.
    pub fn range_of(&self, band: DistanceBand) -> (u32, Option<u32>) {
        match band {
            DistanceBand::PointBlank => (0, Some(self.point_blank_max)),
            DistanceBand::Close => (self.point_blank_max + 1, Some(self.close_max)),
            DistanceBand::Medium => (self.close_max + 1, Some(self.medium_max)),
            DistanceBand::Long => (self.medium_max + 1, Some(self.long_max)),
            DistanceBand::Extreme => (self.long_max + 1, None),
        }
    }
}
