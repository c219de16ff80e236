//! Target selection by experience-tier strategy.

use combat_core::{CombatantId, PcgRng, RngOracle, TargetStrategy};

use super::context::{AiContext, EnemyEstimate};
use super::threat::{self, ThreatProfile};

const MISTAKE_SALT: u64 = 1;
const RANDOM_SALT: u64 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct TargetChoice {
    pub target: CombatantId,
    pub strategy: TargetStrategy,
    /// The pick was the runner-up because of an experience mistake.
    pub mistaken: bool,
    /// Candidates best-first with their scores.
    pub ranking: Vec<(CombatantId, f32)>,
}

/// Ranks `enemies` by the actor's tier strategy and applies the tier's
/// mistake chance. `threats` must be index-aligned with `enemies`.
pub fn select_target(
    ctx: &AiContext<'_>,
    enemies: &[EnemyEstimate],
    threats: &[ThreatProfile],
) -> Option<TargetChoice> {
    if enemies.is_empty() {
        return None;
    }
    let strategy = ctx.tier.target_strategy;
    let rng = PcgRng;

    let mut ranking: Vec<(CombatantId, f32)> = enemies
        .iter()
        .zip(threats)
        .map(|(enemy, threat)| (enemy.id, score(ctx, strategy, enemy, threat)))
        .collect();
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    if strategy == TargetStrategy::Random {
        let pick = rng.range(ctx.seed(RANDOM_SALT), 0, ranking.len() as u32 - 1) as usize;
        ranking.swap(0, pick);
    }

    let roll = rng.roll_d100(ctx.seed(MISTAKE_SALT));
    let mistaken = ranking.len() > 1 && (roll as f32) <= ctx.tier.mistake_chance * 100.0;
    let target = if mistaken { ranking[1].0 } else { ranking[0].0 };

    tracing::debug!(
        actor = %ctx.actor,
        %strategy,
        %target,
        mistaken,
        ?ranking,
        "target selected"
    );
    Some(TargetChoice {
        target,
        strategy,
        mistaken,
        ranking,
    })
}

fn score(
    ctx: &AiContext<'_>,
    strategy: TargetStrategy,
    enemy: &EnemyEstimate,
    threat: &ThreatProfile,
) -> f32 {
    let hp = enemy.effective_hp() as f32;
    match strategy {
        TargetStrategy::Random => 0.0,
        TargetStrategy::Weakest => -hp,
        TargetStrategy::Closest => -(enemy.distance_km as f32) - hp / 10_000.0,
        TargetStrategy::Strongest => threat.overall,
        TargetStrategy::Tactical => threat.overall / threat.defense.max(1.0) * 100.0,
        TargetStrategy::Optimal => {
            let my_output = threat::best_output(&ctx.stats, enemy.band, ctx.tn_against(enemy));
            let kill_speed = my_output / hp.max(1.0) * 100.0;
            kill_speed + threat.overall * 0.5 + (1.0 - enemy.hull_fraction()) * 5.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use crate::config::{AiConfig, ProfileCatalog};
    use combat_core::ExperienceTier;

    fn choose(tier: ExperienceTier, hulls: &[(&str, u32)]) -> TargetChoice {
        let mut roster: Vec<_> = hulls
            .iter()
            .enumerate()
            .map(|(i, (f, h))| combatant(i as u32 + 1, f, *h))
            .collect();
        roster[0] = combatant(1, hulls[0].0, hulls[0].1).with_experience(tier);
        let machine = begin(roster);

        let mut catalog = ProfileCatalog::default();
        let mut profile = tier.profile();
        profile.mistake_chance = 0.0;
        catalog.tiers.insert(tier, profile);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &catalog).unwrap();

        let enemies = ctx.enemies();
        let threats: Vec<_> = enemies.iter().map(|e| threat::assess(&ctx, e)).collect();
        select_target(&ctx, &enemies, &threats).unwrap()
    }

    #[test]
    fn seasoned_pilots_pick_the_weakest() {
        let choice = choose(
            ExperienceTier::Seasoned,
            &[("Navy", 100), ("Pirates", 90), ("Pirates", 30), ("Pirates", 60)],
        );
        assert_eq!(choice.strategy, TargetStrategy::Weakest);
        assert_eq!(choice.target, CombatantId(3));
        assert!(!choice.mistaken);
        assert_eq!(choice.ranking.len(), 3);
    }

    #[test]
    fn closest_breaks_ties_on_health() {
        let choice = choose(
            ExperienceTier::Regular,
            &[("Navy", 100), ("Pirates", 80), ("Pirates", 50)],
        );
        assert_eq!(choice.target, CombatantId(3));
    }

    #[test]
    fn certain_mistake_takes_runner_up() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 90), ("Pirates", 30)]);
        let mut catalog = ProfileCatalog::default();
        let mut profile = ExperienceTier::Seasoned.profile();
        profile.mistake_chance = 1.0;
        catalog.tiers.insert(ExperienceTier::Regular, profile);
        let config = AiConfig::default();
        let ctx = AiContext::new(&machine, CombatantId(1), &config, &catalog).unwrap();

        let enemies = ctx.enemies();
        let threats: Vec<_> = enemies.iter().map(|e| threat::assess(&ctx, e)).collect();
        let choice = select_target(&ctx, &enemies, &threats).unwrap();
        assert!(choice.mistaken);
        assert_eq!(choice.target, CombatantId(2));
    }
}
