//! Turn planner for AI-controlled combatants.
//!
//! # Design
//!
//! [`AiDecisionEngine::plan_turn`] is infallible: every error, including a
//! blown planning deadline or a panic inside a pluggable [`Negotiator`],
//! becomes a logged [`DecisionPlan::fallback`].
//! [`AiDecisionEngine::try_plan`] exposes the underlying result for callers
//! that want to see the failure.
//!
//! # Determinism
//!
//! Planning reads the state machine only. The sole randomness (target
//! mistakes, random targeting) is seeded from [`AiConfig::seed`], the round,
//! and the actor, so the same state always produces the same plan provided
//! the deadline is not hit.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use combat_core::{
    ActionKind, CombatError, CombatStateMachine, CombatantId, ErrorSeverity, ResourceKind,
};
use thiserror::Error;
use tracing::{debug, warn};

use super::comms::{NegotiationReply, NegotiationRequest, Negotiator, StubNegotiator};
use super::context::{AiContext, EnemyEstimate};
use super::movement;
use super::plan::{Agreement, DecisionPlan, PlannedAction};
use super::posture;
use super::projection;
use super::risk::{self, RiskAssessment, Strategy, Verdict};
use super::targeting;
use super::threat::{self, ThreatProfile};
use crate::config::{AiConfig, CommsFallback, ProfileCatalog};

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("combatant {id} is not in the roster")]
    UnknownCombatant { id: CombatantId },

    #[error("combatant {id} is out of the fight")]
    Inactive { id: CombatantId },

    #[error("planning exceeded its {budget_ms} ms budget during {step}")]
    DeadlineExceeded { budget_ms: u64, step: &'static str },

    #[error("planning panicked: {message}")]
    Panicked { message: String },
}

impl CombatError for PlanningError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PlanningError::UnknownCombatant { .. } | PlanningError::Inactive { .. } => {
                ErrorSeverity::Validation
            }
            PlanningError::DeadlineExceeded { .. } => ErrorSeverity::Recoverable,
            PlanningError::Panicked { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlanningError::UnknownCombatant { .. } => "AI_UNKNOWN_COMBATANT",
            PlanningError::Inactive { .. } => "AI_INACTIVE",
            PlanningError::DeadlineExceeded { .. } => "AI_DEADLINE_EXCEEDED",
            PlanningError::Panicked { .. } => "AI_PANICKED",
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub struct AiDecisionEngine {
    config: AiConfig,
    profiles: ProfileCatalog,
    negotiator: Arc<dyn Negotiator>,
}

impl AiDecisionEngine {
    pub fn new(config: AiConfig, profiles: ProfileCatalog) -> Self {
        Self {
            config,
            profiles,
            negotiator: Arc::new(StubNegotiator),
        }
    }

    pub fn with_negotiator(mut self, negotiator: Arc<dyn Negotiator>) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileCatalog {
        &self.profiles
    }

    /// Plans `actor`'s turn, falling back to a defensive stand on any failure.
    pub fn plan_turn(&self, machine: &CombatStateMachine, actor: CombatantId) -> DecisionPlan {
        let started = Instant::now();
        let deadline = started + self.config.planning_budget();
        let planned = panic::catch_unwind(AssertUnwindSafe(|| self.try_plan(machine, actor, deadline)))
            .unwrap_or_else(|payload| {
                Err(PlanningError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });
        match planned {
            Ok(plan) => {
                debug!(
                    %actor,
                    strategy = %plan.strategy,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "turn planned"
                );
                plan
            }
            Err(err) => {
                warn!(%actor, code = err.error_code(), error = %err, "planning failed; using fallback plan");
                DecisionPlan::fallback(actor, machine.round(), err.to_string())
            }
        }
    }

    pub fn try_plan(
        &self,
        machine: &CombatStateMachine,
        actor: CombatantId,
        deadline: Instant,
    ) -> Result<DecisionPlan, PlanningError> {
        let ctx = AiContext::new(machine, actor, &self.config, &self.profiles)
            .ok_or(PlanningError::UnknownCombatant { id: actor })?;
        if !ctx.me.is_active() {
            return Err(PlanningError::Inactive { id: actor });
        }
        self.checkpoint(deadline, "context")?;

        let enemies = ctx.enemies();
        if enemies.is_empty() {
            let mut plan = DecisionPlan::new(actor, ctx.round(), Strategy::Attack);
            plan.note("RISK: no enemies in the fight");
            return Ok(plan);
        }
        let threats: Vec<ThreatProfile> = enemies.iter().map(|e| threat::assess(&ctx, e)).collect();
        self.checkpoint(deadline, "threat assessment")?;

        let risk = risk::assess(&ctx, &threats);
        let mut plan = DecisionPlan::new(actor, ctx.round(), Strategy::Attack);
        let (verdict, agreement) = self.settle_strategy(&ctx, &risk, deadline, &mut plan)?;
        plan.strategy = verdict.strategy;
        if let Some(agreement) = agreement {
            plan.target = agreement.counterpart;
            plan.agreement = Some(agreement);
            return Ok(plan);
        }

        match verdict.strategy {
            Strategy::Flee => self.plan_flight(&ctx, &enemies, &risk, &mut plan),
            strategy => {
                let defensive = strategy == Strategy::DefensiveStand;
                self.plan_engagement(&ctx, &enemies, &threats, &risk, defensive, deadline, &mut plan)?;
            }
        }
        self.checkpoint(deadline, "reassessment")?;

        for line in &plan.reasoning {
            debug!(%actor, "{line}");
        }
        Ok(plan)
    }

    fn checkpoint(&self, deadline: Instant, step: &'static str) -> Result<(), PlanningError> {
        if Instant::now() >= deadline {
            return Err(PlanningError::DeadlineExceeded {
                budget_ms: self.config.planning_budget_ms,
                step,
            });
        }
        Ok(())
    }

    /// Steps 1 and 2: pick a strategy, negotiating where needed. A refused
    /// offer re-enters risk assessment without that strategy until the
    /// recursion cap forces the configured fallback.
    fn settle_strategy(
        &self,
        ctx: &AiContext<'_>,
        risk: &RiskAssessment,
        deadline: Instant,
        plan: &mut DecisionPlan,
    ) -> Result<(Verdict, Option<Agreement>), PlanningError> {
        let mut refused = Vec::new();
        let mut depth = 0;
        loop {
            self.checkpoint(deadline, "risk assessment")?;
            let verdict = risk::decide(risk, &self.config, &refused);
            plan.note(format!("RISK: {} ({})", verdict.strategy, verdict.reason));
            if !verdict.strategy.is_negotiated() {
                return Ok((verdict, None));
            }

            let request = NegotiationRequest {
                from: ctx.actor,
                kind: verdict.strategy,
                counterpart: verdict.counterpart,
                round: ctx.round(),
            };
            match self.negotiator.negotiate(ctx.machine, &request) {
                NegotiationReply::Accepted => {
                    plan.note(format!("COMMS: {} accepted", verdict.strategy));
                    let agreement = Agreement {
                        kind: verdict.strategy,
                        counterpart: verdict.counterpart,
                    };
                    return Ok((verdict, Some(agreement)));
                }
                NegotiationReply::Declined => {
                    plan.note(format!("COMMS: {} declined", verdict.strategy));
                    refused.push(verdict.strategy);
                    if depth >= self.config.comms_recursion_cap {
                        let strategy = match self.config.comms_fallback {
                            CommsFallback::Attack => Strategy::Attack,
                            CommsFallback::DefensiveStand => Strategy::DefensiveStand,
                        };
                        plan.note(format!("COMMS: negotiation exhausted, forcing {strategy}"));
                        return Ok((
                            Verdict {
                                strategy,
                                reason: "negotiation exhausted".to_string(),
                                counterpart: None,
                            },
                            None,
                        ));
                    }
                    depth += 1;
                }
            }
        }
    }

    /// Steps 3 to 5 for ATTACK and DEFENSIVE_STAND.
    #[allow(clippy::too_many_arguments)]
    fn plan_engagement(
        &self,
        ctx: &AiContext<'_>,
        enemies: &[EnemyEstimate],
        threats: &[ThreatProfile],
        risk: &RiskAssessment,
        defensive: bool,
        deadline: Instant,
        plan: &mut DecisionPlan,
    ) -> Result<(), PlanningError> {
        let profile = &risk.profile;
        let Some(choice) = targeting::select_target(ctx, enemies, threats) else {
            return Ok(());
        };
        let projections = projection::project_all(ctx, enemies, threats, profile.risk_tolerance);
        self.checkpoint(deadline, "weapon projection")?;

        // Prefer the strategy's target while it is worth shooting at.
        let engagement = projections
            .iter()
            .find(|p| p.target == choice.target && p.net_value > 0.0)
            .or_else(|| projections.first());
        let target_id = engagement.map_or(choice.target, |p| p.target);
        let Some(index) = enemies.iter().position(|e| e.id == target_id) else {
            return Ok(());
        };
        let (target, target_threat) = (&enemies[index], &threats[index]);
        let projected_weapon = engagement.map(|p| p.weapon_index);
        plan.target = Some(target_id);

        plan.note(format!(
            "TARGET: {} by {}{}",
            target.name,
            choice.strategy,
            if choice.mistaken { " (mistake)" } else { "" }
        ));
        if let Some(p) = engagement {
            plan.note(format!(
                "ACTION: {} vs {}: net {:.1} ({:.1} out, {:.1} in over {} turns)",
                p.weapon,
                target.name,
                p.net_value,
                p.damage,
                p.incoming,
                ctx.config.projection_horizon
            ));
        }

        // Step 4: one lane step, weighted fully toward safety when defending.
        let mut move_profile = profile.clone();
        if defensive {
            move_profile.risk_tolerance = 0.0;
        }
        let step = movement::choose_step(ctx, target, target_threat, projected_weapon, &move_profile);
        let band = step.band_after;
        plan.note(format!("MOVE: {} ({band})", step.action.kind));
        let moved = step.moves();
        if moved {
            plan.movement = Some(step.action);
        }

        // Actions at the band reached after moving.
        let tn = ctx.tn_against(target);
        let in_band = projected_weapon.filter(|i| {
            ctx.stats
                .weapons
                .get(*i)
                .is_some_and(|w| w.can_fire_at(band))
        });
        let weapon = in_band.or_else(|| threat::best_weapon(&ctx.stats, band, tn).map(|(i, _)| i));
        if let (Some(projected), Some(chosen)) = (projected_weapon, weapon)
            && projected != chosen
        {
            plan.note(format!(
                "ACTION: {} out of band at {band}, substituting {}",
                ctx.stats.weapons[projected].name, ctx.stats.weapons[chosen].name
            ));
        }
        plan.actions = self.fill_actions(ctx, target, weapon, defensive);

        // Step 5: posture after this turn's exchange.
        let incoming: f32 = threats
            .iter()
            .map(|t| {
                let at = if t.id == target_id { band } else { t.band };
                t.output_by_band[at.index()]
            })
            .sum();
        let projection = posture::project(ctx, incoming);
        plan.posture = Some(projection.posture);
        plan.bonus_actions = posture::bonus_actions(ctx, projection.posture, Some(target_id));
        if movement_left(ctx, moved) {
            plan.final_movement = posture::final_step(projection.posture, target_id, band, profile)
                .filter(|a| ctx.machine.ability_availability(ctx.actor, a.kind).available);
        }
        plan.note(format!(
            "REASSESS: {} (projected hull {:.0}%)",
            projection.posture,
            projection.projected_hull * 100.0
        ));
        Ok(())
    }

    fn fill_actions(
        &self,
        ctx: &AiContext<'_>,
        target: &EnemyEstimate,
        weapon: Option<usize>,
        defensive: bool,
    ) -> Vec<PlannedAction> {
        let slots = ctx
            .machine
            .budget(ctx.actor)
            .map_or(0, |b| b.remaining(ResourceKind::Action));
        let available = |kind| ctx.machine.ability_availability(ctx.actor, kind).available;

        let mut actions: Vec<PlannedAction> = Vec::new();
        for _ in 0..slots {
            let used = |kind| actions.iter().any(|a: &PlannedAction| a.kind == kind);
            let next = if defensive && !used(ActionKind::Evade) && available(ActionKind::Evade) {
                Some(PlannedAction::new(ActionKind::Evade))
            } else if let Some(i) = weapon.filter(|_| available(ActionKind::FireWeapon)) {
                Some(PlannedAction::fire(target.id, i))
            } else if !target.exact && !used(ActionKind::Scan) && available(ActionKind::Scan) {
                Some(PlannedAction::at(ActionKind::Scan, target.id))
            } else if !used(ActionKind::Evade) && available(ActionKind::Evade) {
                Some(PlannedAction::new(ActionKind::Evade))
            } else {
                None
            };
            match next {
                Some(action) => actions.push(action),
                None => break,
            }
        }
        actions
    }

    /// FLEE: open range from the nearest enemy, evade, and keep running.
    fn plan_flight(
        &self,
        ctx: &AiContext<'_>,
        enemies: &[EnemyEstimate],
        risk: &RiskAssessment,
        plan: &mut DecisionPlan,
    ) {
        let Some(nearest) = enemies
            .iter()
            .min_by(|a, b| a.distance_km.cmp(&b.distance_km).then(a.id.cmp(&b.id)))
        else {
            return;
        };
        let step = movement::retreat_step(ctx, nearest);
        let moved = step.is_some();
        plan.movement = step.map(|s| s.action);
        plan.note(format!(
            "FLEE: breaking away from {}{}",
            nearest.name,
            if risk.at_retreat_edge { " at the retreat edge" } else { "" }
        ));

        if ctx.machine.ability_availability(ctx.actor, ActionKind::Evade).available {
            plan.actions.push(PlannedAction::new(ActionKind::Evade));
        }
        let low_shields = ctx.shield_fraction() < self.config.shield_boost_threshold;
        if low_shields
            && ctx
                .machine
                .ability_availability(ctx.actor, ActionKind::BoostShields)
                .available
        {
            plan.bonus_actions.push(PlannedAction::new(ActionKind::BoostShields));
        }
        if moved && movement_left(ctx, true) {
            plan.final_movement = Some(PlannedAction::at(ActionKind::MoveFarther, nearest.id));
        }
    }
}

/// Whether a second lane step fits in the movement budget.
fn movement_left(ctx: &AiContext<'_>, first_step_taken: bool) -> bool {
    let remaining = ctx
        .machine
        .budget(ctx.actor)
        .map_or(0, |b| b.remaining(ResourceKind::Movement));
    let cost = ctx.machine.config().lane_step_cost;
    let spent = if first_step_taken { cost } else { 0 };
    remaining >= spent + cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::comms::ScriptedNegotiator;
    use crate::ai::testing::*;
    use combat_core::{Combatant, PersonalityKind};

    fn engine() -> AiDecisionEngine {
        AiDecisionEngine::new(AiConfig::default(), ProfileCatalog::default())
    }

    fn struggling(id: u32, hull: u32) -> Combatant {
        let mut c = combatant(id, "Navy", hull);
        c.performance.attacks_made = 6;
        c.performance.attacks_hit = 1;
        c.performance.attacks_missed = 5;
        c
    }

    #[test]
    fn healthy_duel_attacks_with_a_weapon() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let plan = engine().plan_turn(&machine, CombatantId(1));

        assert_eq!(plan.strategy, Strategy::Attack);
        assert!(!plan.fallback);
        assert_eq!(plan.target, Some(CombatantId(2)));
        assert!(plan.actions.iter().any(|a| a.kind == ActionKind::FireWeapon));
        assert!(plan.reasoning.iter().any(|l| l.starts_with("RISK:")));
        assert!(plan.reasoning.iter().any(|l| l.starts_with("REASSESS:")));
    }

    #[test]
    fn crippled_and_outnumbered_flees() {
        let roster = vec![
            struggling(1, 20),
            combatant(2, "Pirates", 100),
            combatant(3, "Pirates", 100),
            combatant(4, "Pirates", 100),
        ];
        let machine = begin(roster);
        let plan = engine().plan_turn(&machine, CombatantId(1));

        assert_eq!(plan.strategy, Strategy::Flee);
        assert_eq!(plan.movement.as_ref().map(|m| m.kind), Some(ActionKind::MoveFarther));
        assert!(plan.actions.iter().all(|a| a.kind != ActionKind::FireWeapon));
    }

    #[test]
    fn zero_budget_falls_back() {
        let config = AiConfig {
            planning_budget_ms: 0,
            ..AiConfig::default()
        };
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let plan = AiDecisionEngine::new(config, ProfileCatalog::default())
            .plan_turn(&machine, CombatantId(1));

        assert!(plan.fallback);
        assert_eq!(plan.strategy, Strategy::DefensiveStand);
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn unknown_combatant_is_an_error() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        let err = engine()
            .try_plan(&machine, CombatantId(9), deadline)
            .unwrap_err();
        assert!(matches!(err, PlanningError::UnknownCombatant { .. }));
    }

    fn battered_diplomats() -> CombatStateMachine {
        begin(vec![
            combatant(1, "Navy", 40).with_personality(PersonalityKind::Diplomat),
            combatant(2, "Pirates", 30),
        ])
    }

    #[test]
    fn accepted_truce_becomes_agreement() {
        let engine = engine().with_negotiator(Arc::new(ScriptedNegotiator::accepting([Strategy::Truce])));
        let plan = engine.plan_turn(&battered_diplomats(), CombatantId(1));

        assert_eq!(plan.strategy, Strategy::Truce);
        let agreement = plan.agreement.unwrap();
        assert_eq!(agreement.kind, Strategy::Truce);
        assert_eq!(agreement.counterpart, Some(CombatantId(2)));
        assert!(plan.actions.is_empty());
    }

    struct Unreachable;

    impl Negotiator for Unreachable {
        fn negotiate(&self, _: &CombatStateMachine, _: &NegotiationRequest) -> NegotiationReply {
            panic!("comms relay offline")
        }
    }

    #[test]
    fn negotiator_panic_becomes_fallback_plan() {
        let engine = engine().with_negotiator(Arc::new(Unreachable));
        let plan = engine.plan_turn(&battered_diplomats(), CombatantId(1));

        assert!(plan.fallback);
        assert_eq!(plan.strategy, Strategy::DefensiveStand);
        assert!(plan.reasoning.iter().any(|l| l.contains("comms relay offline")));
    }

    #[test]
    fn refused_truce_reenters_risk() {
        let plan = engine().plan_turn(&battered_diplomats(), CombatantId(1));
        assert_ne!(plan.strategy, Strategy::Truce);
        assert!(plan.agreement.is_none());
        assert!(plan.reasoning.iter().any(|l| l == "COMMS: TRUCE declined"));
    }

    #[test]
    fn recursion_cap_forces_fallback_strategy() {
        let config = AiConfig {
            comms_recursion_cap: 0,
            comms_fallback: CommsFallback::DefensiveStand,
            ..AiConfig::default()
        };
        let plan = AiDecisionEngine::new(config, ProfileCatalog::default())
            .plan_turn(&battered_diplomats(), CombatantId(1));

        assert_eq!(plan.strategy, Strategy::DefensiveStand);
        assert!(plan
            .reasoning
            .iter()
            .any(|l| l.contains("negotiation exhausted")));
    }
}
