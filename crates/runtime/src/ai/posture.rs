//! Next-turn posture and the bonus/final-movement choices it drives
//! (planning step 5).

use combat_core::{ActionKind, CombatantId, DistanceBand, PersonalityProfile};
use serde::{Deserialize, Serialize};

use super::context::{AiContext, fraction};
use super::plan::PlannedAction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Posture {
    Defensive,
    Cautious,
    Offensive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostureProjection {
    pub posture: Posture,
    /// Hull fraction expected after one more round of incoming fire.
    pub projected_hull: f32,
}

/// Shields soak `incoming` first; the overflow comes off the hull.
pub fn project(ctx: &AiContext<'_>, incoming: f32) -> PostureProjection {
    let overflow = (incoming - ctx.shields() as f32).max(0.0);
    let hull = (ctx.hull() as f32 - overflow).max(0.0);
    let projected_hull = fraction(hull.round() as u32, ctx.stats.max_hull);
    let posture = if projected_hull < ctx.config.defensive_posture_hp {
        Posture::Defensive
    } else if projected_hull >= ctx.config.offensive_posture_hp {
        Posture::Offensive
    } else {
        Posture::Cautious
    };
    PostureProjection {
        posture,
        projected_hull,
    }
}

/// Bonus actions for the posture, one per remaining bonus action, no repeats.
pub fn bonus_actions(
    ctx: &AiContext<'_>,
    posture: Posture,
    target: Option<CombatantId>,
) -> Vec<PlannedAction> {
    let slots = ctx
        .machine
        .budget(ctx.actor)
        .map(|b| b.remaining(combat_core::ResourceKind::BonusAction))
        .unwrap_or(0) as usize;
    let low_shields = ctx.shield_fraction() < ctx.config.shield_boost_threshold;

    let preferences: &[ActionKind] = match posture {
        Posture::Defensive => &[ActionKind::BoostShields, ActionKind::JamSensors],
        Posture::Cautious => &[ActionKind::BoostShields, ActionKind::TargetLock],
        Posture::Offensive => &[ActionKind::TargetLock, ActionKind::BoostShields],
    };

    preferences
        .iter()
        .filter(|kind| **kind != ActionKind::BoostShields || low_shields)
        .filter(|kind| ctx.machine.ability_availability(ctx.actor, **kind).available)
        .filter_map(|kind| match kind {
            ActionKind::BoostShields => Some(PlannedAction::new(*kind)),
            _ => target.map(|t| PlannedAction::at(*kind, t)),
        })
        .take(slots)
        .collect()
}

/// Final lane step after actions: defensive ships open range, offensive
/// ships drift toward their preferred band.
pub fn final_step(
    posture: Posture,
    target: CombatantId,
    band_after: DistanceBand,
    profile: &PersonalityProfile,
) -> Option<PlannedAction> {
    let kind = match posture {
        Posture::Defensive if band_after < DistanceBand::Extreme => ActionKind::MoveFarther,
        Posture::Offensive if band_after > profile.preferred_band => ActionKind::MoveCloser,
        Posture::Offensive if band_after < profile.preferred_band => ActionKind::MoveFarther,
        _ => return None,
    };
    Some(PlannedAction::at(kind, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use crate::config::{AiConfig, ProfileCatalog};
    use combat_core::PersonalityKind;

    #[test]
    fn heavy_fire_projects_defensive() {
        let machine = skirmish(&[("Navy", 50), ("Pirates", 100)]);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();

        // 40 shields absorb the first 40; 60 incoming leaves 30 hull.
        let projection = project(&ctx, 60.0);
        assert_eq!(projection.posture, Posture::Defensive);
        assert!((projection.projected_hull - 0.3).abs() < 1e-6);
        assert_eq!(project(&ctx, 0.0).posture, Posture::Cautious);
    }

    #[test]
    fn offensive_posture_locks_target() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();

        let bonus = bonus_actions(&ctx, Posture::Offensive, Some(CombatantId(2)));
        assert_eq!(bonus, vec![PlannedAction::at(ActionKind::TargetLock, CombatantId(2))]);
    }

    #[test]
    fn final_step_follows_posture() {
        let profile = PersonalityKind::Aggressive.profile();
        let target = CombatantId(2);
        assert_eq!(
            final_step(Posture::Offensive, target, DistanceBand::Long, &profile),
            Some(PlannedAction::at(ActionKind::MoveCloser, target))
        );
        assert_eq!(
            final_step(Posture::Defensive, target, DistanceBand::Long, &profile),
            Some(PlannedAction::at(ActionKind::MoveFarther, target))
        );
        assert_eq!(final_step(Posture::Cautious, target, DistanceBand::Long, &profile), None);
    }
}
