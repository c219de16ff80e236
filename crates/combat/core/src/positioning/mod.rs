//! Lane-based relative placement of combatants.
//!
//! The engagement line is a fixed row of lanes. Each side owns a contiguous
//! half; movement is one lane per request and never crosses the midline, so
//! opposing factions can close to POINT_BLANK but never pass each other.
//!
//! Movement points are the caller's concern: [`PositioningModel::move_closer`]
//! and [`PositioningModel::move_farther`] always grant at most a single step.

mod band;

pub use band::DistanceBand;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::config::{BandBounds, CombatConfig, ConfigError};
use crate::state::{CombatantId, Faction};

/// Half of the lane line a faction fights from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Near,
    Far,
}

/// Direction of a single lane step relative to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepDirection {
    Closer,
    Farther,
}

/// Result of a movement request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveOutcome {
    pub mover: CombatantId,
    pub target: CombatantId,
    pub direction: StepDirection,
    pub old_lane: u8,
    pub new_lane: u8,
    pub old_distance: u32,
    pub new_distance: u32,
    pub old_band: DistanceBand,
    pub new_band: DistanceBand,
    pub band_changed: bool,
    /// False when the step was clamped away (already at the side's edge or midline).
    pub moved: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Placement {
    lane: u8,
    side: Side,
}

/// Lane positions of every combatant plus the geometry needed to measure them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositioningModel {
    lane_count: u8,
    km_per_lane: u32,
    near_side_max: u8,
    near_start_lane: u8,
    far_start_lane: u8,
    bands: BandBounds,
    placements: BTreeMap<CombatantId, Placement>,
    sides: Vec<(Faction, Side)>,
}

impl PositioningModel {
    /// Creates an empty model using the lane geometry of `config`.
    pub fn new(config: &CombatConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lane_count: config.lane_count,
            km_per_lane: config.km_per_lane,
            near_side_max: config.near_side_max,
            near_start_lane: config.near_start_lane,
            far_start_lane: config.far_start_lane,
            bands: config.bands,
            placements: BTreeMap::new(),
            sides: Vec::new(),
        })
    }

    /// Places every combatant at its faction's starting lane.
    ///
    /// The first faction encountered takes the near side; every other faction
    /// fights from the far side.
    pub fn initialize<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (CombatantId, Faction)>,
    {
        self.placements.clear();
        self.sides.clear();
        for (id, faction) in entries {
            self.place(id, &faction);
        }
    }

    /// Places a single combatant at its faction's starting lane.
    pub fn place(&mut self, id: CombatantId, faction: &Faction) {
        let side = self.side_for_faction(faction);
        let lane = match side {
            Side::Near => self.near_start_lane,
            Side::Far => self.far_start_lane,
        };
        let lane = self.clamp_to_side(side, lane);
        self.placements.insert(id, Placement { lane, side });
    }

    /// Restores an exact lane (used by snapshot import). The lane is clamped
    /// to the combatant's legal half.
    pub fn set_lane(&mut self, id: CombatantId, faction: &Faction, lane: u8) {
        let side = self.side_for_faction(faction);
        let lane = self.clamp_to_side(side, lane);
        self.placements.insert(id, Placement { lane, side });
    }

    /// Removes a combatant from the line.
    pub fn remove(&mut self, id: CombatantId) {
        self.placements.remove(&id);
    }

    fn side_for_faction(&mut self, faction: &Faction) -> Side {
        if let Some((_, side)) = self.sides.iter().find(|(f, _)| f == faction) {
            return *side;
        }
        let side = if self.sides.is_empty() {
            Side::Near
        } else {
            Side::Far
        };
        self.sides.push((faction.clone(), side));
        side
    }

    /// Legal lanes for a side.
    pub fn legal_lanes(&self, side: Side) -> RangeInclusive<u8> {
        match side {
            Side::Near => 0..=self.near_side_max,
            Side::Far => self.near_side_max.saturating_add(1)..=self.lane_count.saturating_sub(1),
        }
    }

    fn clamp_to_side(&self, side: Side, lane: u8) -> u8 {
        let range = self.legal_lanes(side);
        lane.min(*range.end()).max(*range.start())
    }

    /// Lane of a combatant. Unknown combatants report lane 0.
    pub fn lane(&self, id: CombatantId) -> u8 {
        match self.placements.get(&id) {
            Some(placement) => placement.lane,
            None => {
                tracing::warn!("position requested for unknown combatant {id}; using lane 0");
                0
            }
        }
    }

    /// Side of a combatant, if placed.
    pub fn side(&self, id: CombatantId) -> Option<Side> {
        self.placements.get(&id).map(|p| p.side)
    }

    /// Distance in km: `|lane_a - lane_b| * km_per_lane`.
    pub fn distance(&self, a: CombatantId, b: CombatantId) -> u32 {
        self.distance_between_lanes(self.lane(a), self.lane(b))
    }

    /// Distance in km between two raw lanes.
    pub fn distance_between_lanes(&self, a: u8, b: u8) -> u32 {
        u32::from(a.abs_diff(b)) * self.km_per_lane
    }

    /// Band between two combatants.
    pub fn band(&self, a: CombatantId, b: CombatantId) -> DistanceBand {
        self.bands.classify(self.distance(a, b))
    }

    /// Band key between two combatants (e.g. `"LONG"`).
    pub fn band_key(&self, a: CombatantId, b: CombatantId) -> &'static str {
        self.band(a, b).key()
    }

    /// Band for a raw distance.
    pub fn band_for_distance(&self, distance_km: u32) -> DistanceBand {
        self.bands.classify(distance_km)
    }

    /// Returns true if the combatant stands on its side's outermost lane.
    pub fn at_retreat_edge(&self, id: CombatantId) -> bool {
        match self.placements.get(&id) {
            Some(Placement {
                lane,
                side: Side::Near,
            }) => *lane == 0,
            Some(Placement {
                lane,
                side: Side::Far,
            }) => *lane == self.lane_count - 1,
            None => false,
        }
    }

    /// Iterates over `(combatant, lane)` pairs in id order.
    pub fn lanes(&self) -> impl Iterator<Item = (CombatantId, u8)> + '_ {
        self.placements.iter().map(|(id, p)| (*id, p.lane))
    }

    /// Computes a single-lane step without applying it.
    pub fn preview_step(
        &self,
        mover: CombatantId,
        target: CombatantId,
        direction: StepDirection,
    ) -> MoveOutcome {
        let old_lane = self.lane(mover);
        let target_lane = self.lane(target);
        let side = self.side(mover).unwrap_or(Side::Near);

        let delta: i16 = match direction {
            StepDirection::Closer => match target_lane.cmp(&old_lane) {
                core::cmp::Ordering::Greater => 1,
                core::cmp::Ordering::Less => -1,
                core::cmp::Ordering::Equal => 0,
            },
            StepDirection::Farther => match target_lane.cmp(&old_lane) {
                core::cmp::Ordering::Greater => -1,
                core::cmp::Ordering::Less => 1,
                // Same lane: retreat toward the side's outer edge.
                core::cmp::Ordering::Equal => match side {
                    Side::Near => -1,
                    Side::Far => 1,
                },
            },
        };

        let stepped = (i16::from(old_lane) + delta).clamp(0, i16::from(self.lane_count - 1)) as u8;
        let new_lane = self.clamp_to_side(side, stepped);

        let old_distance = self.distance_between_lanes(old_lane, target_lane);
        let new_distance = self.distance_between_lanes(new_lane, target_lane);
        let old_band = self.bands.classify(old_distance);
        let new_band = self.bands.classify(new_distance);

        MoveOutcome {
            mover,
            target,
            direction,
            old_lane,
            new_lane,
            old_distance,
            new_distance,
            old_band,
            new_band,
            band_changed: old_band != new_band,
            moved: new_lane != old_lane,
        }
    }

    fn step(&mut self, mover: CombatantId, target: CombatantId, direction: StepDirection) -> MoveOutcome {
        let outcome = self.preview_step(mover, target, direction);
        if outcome.moved
            && let Some(placement) = self.placements.get_mut(&mover)
        {
            placement.lane = outcome.new_lane;
        }
        outcome
    }

    /// Moves one lane toward `target`, clamped to the mover's half.
    pub fn move_closer(&mut self, mover: CombatantId, target: CombatantId) -> MoveOutcome {
        self.step(mover, target, StepDirection::Closer)
    }

    /// Moves one lane away from `target`, clamped to the mover's half.
    pub fn move_farther(&mut self, mover: CombatantId, target: CombatantId) -> MoveOutcome {
        self.step(mover, target, StepDirection::Farther)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sided() -> PositioningModel {
        let mut model = PositioningModel::new(&CombatConfig::default()).unwrap();
        model.initialize([
            (CombatantId(1), Faction::new("federation")),
            (CombatantId(2), Faction::new("raiders")),
        ]);
        model
    }

    #[test]
    fn lane_two_versus_lane_seven_is_long_range() {
        let model = two_sided();
        assert_eq!(model.lane(CombatantId(1)), 2);
        assert_eq!(model.lane(CombatantId(2)), 7);
        assert_eq!(model.distance(CombatantId(1), CombatantId(2)), 500);
        assert_eq!(model.band(CombatantId(1), CombatantId(2)), DistanceBand::Long);
        assert_eq!(model.band_key(CombatantId(1), CombatantId(2)), "LONG");
    }

    #[test]
    fn distance_is_symmetric_and_monotonic() {
        let model = two_sided();
        for a in 0..10u8 {
            for b in 0..10u8 {
                assert_eq!(
                    model.distance_between_lanes(a, b),
                    model.distance_between_lanes(b, a)
                );
                if b < 9 && b >= a {
                    assert!(
                        model.distance_between_lanes(a, b + 1) > model.distance_between_lanes(a, b)
                    );
                }
            }
        }
    }

    #[test]
    fn move_closer_stops_at_midline() {
        let mut model = two_sided();
        let a = CombatantId(1);
        let b = CombatantId(2);

        let first = model.move_closer(a, b);
        assert!(first.moved);
        assert_eq!((first.old_lane, first.new_lane), (2, 3));
        assert_eq!(first.old_distance, 500);
        assert_eq!(first.new_distance, 400);
        assert!(first.band_changed);
        assert_eq!(first.new_band, DistanceBand::Medium);

        model.move_closer(a, b);
        let clamped = model.move_closer(a, b);
        assert!(!clamped.moved);
        assert_eq!(model.lane(a), 4);

        for _ in 0..5 {
            model.move_closer(b, a);
        }
        assert_eq!(model.lane(b), 5);
        assert_eq!(model.band(a, b), DistanceBand::PointBlank);
    }

    #[test]
    fn move_farther_stops_at_edge() {
        let mut model = two_sided();
        let a = CombatantId(1);
        let b = CombatantId(2);
        model.move_farther(a, b);
        model.move_farther(a, b);
        let outcome = model.move_farther(a, b);
        assert!(!outcome.moved);
        assert_eq!(model.lane(a), 0);
        assert!(model.at_retreat_edge(a));
        assert_eq!(model.band(a, b), DistanceBand::Extreme);
    }

    #[test]
    fn preview_does_not_mutate() {
        let model = two_sided();
        let preview = model.preview_step(CombatantId(1), CombatantId(2), StepDirection::Closer);
        assert_eq!(preview.new_lane, 3);
        assert_eq!(model.lane(CombatantId(1)), 2);
    }

    #[test]
    fn unknown_combatant_defaults_to_lane_zero() {
        let model = two_sided();
        assert_eq!(model.lane(CombatantId(99)), 0);
        assert_eq!(model.distance(CombatantId(99), CombatantId(2)), 700);
    }

    #[test]
    fn third_faction_joins_far_side() {
        let mut model = PositioningModel::new(&CombatConfig::default()).unwrap();
        model.initialize([
            (CombatantId(1), Faction::new("a")),
            (CombatantId(2), Faction::new("b")),
            (CombatantId(3), Faction::new("c")),
            (CombatantId(4), Faction::new("a")),
        ]);
        assert_eq!(model.side(CombatantId(1)), Some(Side::Near));
        assert_eq!(model.side(CombatantId(3)), Some(Side::Far));
        assert_eq!(model.side(CombatantId(4)), Some(Side::Near));
    }

    #[test]
    fn overlapping_sides_are_rejected() {
        let config = CombatConfig {
            lane_count: 4,
            near_side_max: 4,
            ..CombatConfig::default()
        };
        assert!(matches!(
            PositioningModel::new(&config),
            Err(ConfigError::InvalidLanes { lane_count: 4, .. })
        ));
    }
}
