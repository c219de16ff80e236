//! Strategic risk assessment (planning step 1).
//!
//! [`assess`] gathers the numbers; [`decide`] applies the rules in a fixed
//! precedence: FLEE, SURRENDER, REQUEST_SURRENDER, TRUCE, DEFENSIVE_STAND,
//! ATTACK. Strategies already refused in negotiation are skipped.

use combat_core::{CombatantId, PersonalityProfile, SituationalFactors, SituationalModifier};
use serde::{Deserialize, Serialize};

use super::context::AiContext;
use super::threat::{self, ThreatProfile};
use crate::config::AiConfig;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Attack,
    DefensiveStand,
    Flee,
    Surrender,
    RequestSurrender,
    Truce,
}

impl Strategy {
    /// Needs the other side's agreement.
    pub const fn is_negotiated(self) -> bool {
        matches!(self, Self::Surrender | Self::RequestSurrender | Self::Truce)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RiskAssessment {
    pub hull_fraction: f32,
    pub shield_fraction: f32,
    pub hit_rate: Option<f32>,
    pub attacks_made: u32,
    pub ally_strength: f32,
    pub enemy_strength: f32,
    pub ally_count: usize,
    pub enemy_count: usize,
    pub enemy_avg_hull: f32,
    pub weakest_enemy: Option<CombatantId>,
    /// Expected damage per round from all enemies at current bands.
    pub incoming: f32,
    /// Current hull plus shields.
    pub pool: u32,
    /// Best mobility edge over any enemy's; negative means out-run.
    pub mobility: i32,
    pub at_retreat_edge: bool,
    pub profile: PersonalityProfile,
    pub modifiers: Vec<SituationalModifier>,
}

impl RiskAssessment {
    /// Enemy strength over ally strength.
    pub fn force_ratio(&self) -> f32 {
        self.enemy_strength / self.ally_strength.max(1.0)
    }

    /// Ally strength over enemy strength.
    pub fn advantage_ratio(&self) -> f32 {
        self.ally_strength / self.enemy_strength.max(1.0)
    }

    pub fn performing_poorly(&self, config: &AiConfig) -> bool {
        self.hit_rate.is_some_and(|rate| rate < config.poor_hit_rate)
    }
}

pub fn assess(ctx: &AiContext<'_>, threats: &[ThreatProfile]) -> RiskAssessment {
    let enemies = ctx.enemies();
    let allies = ctx.allies();

    let ally_strength = threat::combat_value(&ctx.stats, ctx.hull(), ctx.shields())
        + allies
            .iter()
            .map(|a| {
                threat::combat_value(
                    &a.ship.combat_stats(),
                    a.ship.current_hull(),
                    a.ship.current_shields(),
                )
            })
            .sum::<f32>();
    let enemy_strength: f32 = enemies
        .iter()
        .map(|e| threat::combat_value(&e.stats, e.hull, e.shields))
        .sum();

    let enemy_avg_hull = if enemies.is_empty() {
        0.0
    } else {
        enemies.iter().map(|e| e.hull_fraction()).sum::<f32>() / enemies.len() as f32
    };
    let weakest_enemy = enemies
        .iter()
        .min_by(|a, b| a.effective_hp().cmp(&b.effective_hp()).then(a.id.cmp(&b.id)))
        .map(|e| e.id);
    // Fleeing needs to keep pace with the fastest pursuer.
    let mobility = threats.iter().map(|t| -t.mobility).min().unwrap_or(0);

    let hull_fraction = ctx.hull_fraction();
    let factors = SituationalFactors {
        hull_fraction,
        outnumbered: enemies.len() > allies.len() + 1,
        has_advantage: ally_strength > enemy_strength * 1.5,
        at_retreat_edge: ctx.at_retreat_edge(),
    };
    let (profile, modifiers) = ctx.personality.adjusted(&factors);

    RiskAssessment {
        hull_fraction,
        shield_fraction: ctx.shield_fraction(),
        hit_rate: ctx.me.performance.hit_rate(),
        attacks_made: ctx.me.performance.attacks_made,
        ally_strength,
        enemy_strength,
        ally_count: allies.len() + 1,
        enemy_count: enemies.len(),
        enemy_avg_hull,
        weakest_enemy,
        incoming: threat::incoming_estimate(threats),
        pool: ctx.hull() + ctx.shields(),
        mobility,
        at_retreat_edge: factors.at_retreat_edge,
        profile,
        modifiers,
    }
}

/// Strategy picked by [`decide`], with the reason and negotiation counterpart.
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub strategy: Strategy,
    pub reason: String,
    pub counterpart: Option<CombatantId>,
}

pub fn decide(risk: &RiskAssessment, config: &AiConfig, refused: &[Strategy]) -> Verdict {
    let p = &risk.profile;
    let open = |s: Strategy| !refused.contains(&s);
    let poor = risk.performing_poorly(config);

    let losing_badly = risk.hull_fraction <= config.flee_hull.max(p.retreat_hp_pct)
        && risk.force_ratio() >= 1.5;
    let cornered = risk.hull_fraction <= config.surrender_hull
        && risk.force_ratio() >= config.outnumbered_ratio
        && p.aggression < 0.5
        && poor;
    let outpaced = risk.mobility < 0 && !risk.at_retreat_edge;

    // A ship that cannot outrun its pursuers gives up only when it would
    // also qualify for surrender; otherwise it still runs.
    if open(Strategy::Surrender) && cornered && outpaced {
        return surrender(risk);
    }

    if open(Strategy::Flee) && losing_badly && poor {
        return verdict(
            Strategy::Flee,
            format!(
                "hull {:.0}%, outmatched {:.1}:1, hit rate {:.0}%{}",
                risk.hull_fraction * 100.0,
                risk.force_ratio(),
                risk.hit_rate.unwrap_or(0.0) * 100.0,
                if outpaced { ", outpaced" } else { "" }
            ),
            None,
        );
    }

    if open(Strategy::Surrender) && cornered {
        return surrender(risk);
    }

    if open(Strategy::RequestSurrender)
        && risk.advantage_ratio() >= config.dominance_ratio
        && p.aggression < 0.9
        && risk.weakest_enemy.is_some()
    {
        return verdict(
            Strategy::RequestSurrender,
            format!("dominant {:.1}:1", risk.advantage_ratio()),
            risk.weakest_enemy,
        );
    }

    if open(Strategy::Truce)
        && risk.hull_fraction < 0.5
        && risk.enemy_avg_hull < 0.5
        && p.negotiate >= 1.2
    {
        return verdict(
            Strategy::Truce,
            format!(
                "both sides battered ({:.0}% vs {:.0}%)",
                risk.hull_fraction * 100.0,
                risk.enemy_avg_hull * 100.0
            ),
            risk.weakest_enemy,
        );
    }

    let heavy_fire = risk.incoming >= risk.pool as f32 * 0.25;
    if open(Strategy::DefensiveStand)
        && (risk.hull_fraction < 0.5 || heavy_fire)
        && p.risk_tolerance < 0.5
    {
        return verdict(
            Strategy::DefensiveStand,
            format!(
                "hull {:.0}%, incoming {:.1}/round",
                risk.hull_fraction * 100.0,
                risk.incoming
            ),
            None,
        );
    }

    verdict(Strategy::Attack, "engaging".to_string(), None)
}

fn surrender(risk: &RiskAssessment) -> Verdict {
    verdict(
        Strategy::Surrender,
        format!("hull {:.0}% with no way out", risk.hull_fraction * 100.0),
        risk.weakest_enemy,
    )
}

fn verdict(strategy: Strategy, reason: String, counterpart: Option<CombatantId>) -> Verdict {
    Verdict {
        strategy,
        reason,
        counterpart,
    }
}
