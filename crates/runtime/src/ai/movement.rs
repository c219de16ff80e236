//! Single-step movement choice (planning step 4).

use combat_core::{ActionKind, DistanceBand, PersonalityProfile, StepDirection};

use super::context::{AiContext, EnemyEstimate};
use super::plan::PlannedAction;
use super::threat::{self, ThreatProfile};

#[derive(Clone, Debug, PartialEq)]
pub struct MovementChoice {
    pub action: PlannedAction,
    /// Band to the engaged target after the step.
    pub band_after: DistanceBand,
    pub scores: Vec<(ActionKind, f32)>,
}

impl MovementChoice {
    pub fn moves(&self) -> bool {
        self.action.kind != ActionKind::Hold
    }
}

/// Scores hold, closer, and farther against `target` and keeps the best.
/// Ties keep position.
pub fn choose_step(
    ctx: &AiContext<'_>,
    target: &EnemyEstimate,
    threat: &ThreatProfile,
    weapon: Option<usize>,
    profile: &PersonalityProfile,
) -> MovementChoice {
    let tn = ctx.tn_against(target);
    let value = |band: DistanceBand| {
        let outgoing = match weapon.and_then(|i| ctx.stats.weapons.get(i)) {
            Some(w) => threat::expected_volley(w, band, ctx.stats.attack_bonus, tn),
            None => threat::best_output(&ctx.stats, band, tn),
        };
        let incoming = threat.output_by_band[band.index()];
        let drift = band.steps_to(profile.preferred_band) as f32 * 0.5;
        profile.attack * outgoing - (1.0 - profile.risk_tolerance) * incoming - drift
    };

    let mut best = (PlannedAction::new(ActionKind::Hold), target.band, value(target.band));
    let mut scores = vec![(ActionKind::Hold, best.2)];

    for (kind, direction) in [
        (ActionKind::MoveCloser, StepDirection::Closer),
        (ActionKind::MoveFarther, StepDirection::Farther),
    ] {
        if !ctx.machine.ability_availability(ctx.actor, kind).available {
            continue;
        }
        let preview = ctx.machine.positions().preview_step(ctx.actor, target.id, direction);
        if !preview.moved {
            continue;
        }
        let score = value(preview.new_band);
        scores.push((kind, score));
        if score > best.2 {
            best = (PlannedAction::at(kind, target.id), preview.new_band, score);
        }
    }

    tracing::debug!(actor = %ctx.actor, target = %target.id, ?scores, chosen = %best.0.kind, "movement scored");
    MovementChoice {
        action: best.0,
        band_after: best.1,
        scores,
    }
}

/// Step away from `from`, if possible.
pub fn retreat_step(ctx: &AiContext<'_>, from: &EnemyEstimate) -> Option<MovementChoice> {
    if !ctx
        .machine
        .ability_availability(ctx.actor, ActionKind::MoveFarther)
        .available
    {
        return None;
    }
    let preview = ctx
        .machine
        .positions()
        .preview_step(ctx.actor, from.id, StepDirection::Farther);
    preview.moved.then(|| MovementChoice {
        action: PlannedAction::at(ActionKind::MoveFarther, from.id),
        band_after: preview.new_band,
        scores: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use crate::config::{AiConfig, ProfileCatalog};
    use combat_core::{CombatantId, PersonalityKind};

    fn choice_for(kind: PersonalityKind, weapon: Option<usize>) -> MovementChoice {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &ProfileCatalog::default())
            .unwrap();
        let enemy = ctx.estimate(CombatantId(2)).unwrap();
        let threat = threat::assess(&ctx, &enemy);
        choose_step(&ctx, &enemy, &threat, weapon, &kind.profile())
    }

    #[test]
    fn torpedo_run_closes_to_medium() {
        let choice = choice_for(PersonalityKind::Aggressive, Some(1));
        assert_eq!(choice.action.kind, ActionKind::MoveCloser);
        assert_eq!(choice.band_after, DistanceBand::Medium);
        assert_eq!(choice.action.target, Some(CombatantId(2)));
    }

    #[test]
    fn coward_will_not_close_for_torpedoes() {
        let choice = choice_for(PersonalityKind::Coward, Some(1));
        assert_eq!(choice.action.kind, ActionKind::Hold);
        assert!(!choice.moves());
        assert_eq!(choice.band_after, DistanceBand::Long);
    }

    #[test]
    fn every_option_is_scored() {
        let choice = choice_for(PersonalityKind::Balanced, None);
        assert_eq!(choice.scores.len(), 3);
    }
}
