//! Effect functions of the built-in catalogue.
//!
//! Effects run after validation and resource spending. They mutate combat
//! state only through the state machine's public mutation API.

use crate::action::{ActionOutcome, ActionRejection, ActionRequest};
use crate::engine::CombatStateMachine;
use crate::positioning::StepDirection;
use crate::state::{StatusEffect, StatusKind};

fn target_of(request: &ActionRequest) -> Result<crate::state::CombatantId, ActionOutcome> {
    request.target.ok_or_else(|| {
        ActionOutcome::rejected(
            request.actor,
            request.kind,
            ActionRejection::MissingTarget {
                action: request.kind,
            },
        )
    })
}

fn fraction_of(max: u32, fraction: f32) -> u32 {
    (max as f32 * fraction).floor() as u32
}

// ============================================================================
// Main actions
// ============================================================================

/// Resolves the to-hit roll only. Damage waits for the reaction window.
pub(super) fn fire_weapon(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let target = match target_of(request) {
        Ok(target) => target,
        Err(outcome) => return outcome,
    };
    match m.roll_attack(request.actor, target, request.weapon) {
        Ok(pending) => {
            let message = format!(
                "{} fires {} at {} ({}): {} vs TN {} ({})",
                m.name_of(request.actor),
                pending.weapon.name,
                m.name_of(target),
                pending.band,
                pending.attack.total,
                pending.attack.target_tn,
                if pending.attack.crit {
                    "critical hit"
                } else if pending.attack.hit {
                    "hit"
                } else {
                    "miss"
                }
            );
            ActionOutcome {
                pending_attack: Some(pending),
                ..ActionOutcome::success(request.actor, request.kind, message).with_target(target)
            }
        }
        Err(rejection) => ActionOutcome::rejected(request.actor, request.kind, rejection),
    }
}

pub(super) fn scan(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let target = match target_of(request) {
        Ok(target) => target,
        Err(outcome) => return outcome,
    };
    m.record_scan(request.actor, target);
    let message = format!("{} scans {}", m.name_of(request.actor), m.name_of(target));
    ActionOutcome::success(request.actor, request.kind, message).with_target(target)
}

pub(super) fn evade(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let bonus = m.config().effects.evade_bonus;
    let round = m.round();
    let effect = StatusEffect::new(StatusKind::Evasive, bonus, Some(1)).from_source(request.actor, round);
    if !m.add_status_effect(request.actor, effect) {
        return ActionOutcome::failure(request.actor, request.kind, "status effect list is full");
    }
    let message = format!("{} evades (+{bonus} evasion)", m.name_of(request.actor));
    ActionOutcome::success(request.actor, request.kind, message)
}

// ============================================================================
// Bonus actions
// ============================================================================

pub(super) fn boost_shields(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let Some(stats) = m.ship_stats(request.actor) else {
        return ActionOutcome::rejected(
            request.actor,
            request.kind,
            ActionRejection::UnknownCombatant { id: request.actor },
        );
    };
    let amount = fraction_of(stats.max_shields, m.config().effects.shield_boost_fraction);
    match m.restore_shields(request.actor, amount) {
        Ok(restored) => {
            let message = format!("{} boosts shields (+{restored})", m.name_of(request.actor));
            ActionOutcome {
                shields_restored: Some(restored),
                ..ActionOutcome::success(request.actor, request.kind, message)
            }
        }
        Err(err) => ActionOutcome::failure(request.actor, request.kind, err.to_string()),
    }
}

pub(super) fn target_lock(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let target = match target_of(request) {
        Ok(target) => target,
        Err(outcome) => return outcome,
    };
    let bonus = m.config().effects.target_lock_bonus;
    let effect = StatusEffect::new(StatusKind::TargetLocked, bonus, Some(2))
        .from_source(request.actor, m.round())
        .against(target);
    if !m.add_status_effect(request.actor, effect) {
        return ActionOutcome::failure(request.actor, request.kind, "status effect list is full");
    }
    let message = format!(
        "{} locks onto {} (+{bonus} to hit)",
        m.name_of(request.actor),
        m.name_of(target)
    );
    ActionOutcome::success(request.actor, request.kind, message).with_target(target)
}

pub(super) fn jam_sensors(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let target = match target_of(request) {
        Ok(target) => target,
        Err(outcome) => return outcome,
    };
    let penalty = m.config().effects.jam_penalty;
    let effect = StatusEffect::new(StatusKind::SensorJammed, penalty, Some(2))
        .from_source(request.actor, m.round());
    if !m.add_status_effect(target, effect) {
        return ActionOutcome::failure(request.actor, request.kind, "status effect list is full");
    }
    let message = format!(
        "{} jams {}'s sensors (-{penalty} to hit)",
        m.name_of(request.actor),
        m.name_of(target)
    );
    ActionOutcome::success(request.actor, request.kind, message).with_target(target)
}

// ============================================================================
// Movement
// ============================================================================

fn step(m: &mut CombatStateMachine, request: &ActionRequest, direction: StepDirection) -> ActionOutcome {
    let target = match target_of(request) {
        Ok(target) => target,
        Err(outcome) => return outcome,
    };
    let outcome = m.move_combatant(request.actor, target, direction);
    if !outcome.moved {
        return ActionOutcome::rejected(
            request.actor,
            request.kind,
            ActionRejection::MovementBlocked {
                action: request.kind,
            },
        );
    }
    let message = format!(
        "{} moves {} {}: {} km -> {} km ({} -> {})",
        m.name_of(request.actor),
        match direction {
            StepDirection::Closer => "closer to",
            StepDirection::Farther => "away from",
        },
        m.name_of(target),
        outcome.old_distance,
        outcome.new_distance,
        outcome.old_band,
        outcome.new_band,
    );
    ActionOutcome {
        movement: Some(outcome),
        ..ActionOutcome::success(request.actor, request.kind, message).with_target(target)
    }
}

pub(super) fn move_closer(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    step(m, request, StepDirection::Closer)
}

pub(super) fn move_farther(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    step(m, request, StepDirection::Farther)
}

pub(super) fn hold(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let message = format!("{} holds position", m.name_of(request.actor));
    ActionOutcome::success(request.actor, request.kind, message)
}

// ============================================================================
// Reactions
// ============================================================================

pub(super) fn evasive_maneuvers(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let bonus = m.config().effects.evasive_reaction_bonus;
    let effect = StatusEffect::new(StatusKind::Evasive, bonus, Some(1)).from_source(request.actor, m.round());
    if !m.add_status_effect(request.actor, effect) {
        return ActionOutcome::failure(request.actor, request.kind, "status effect list is full");
    }
    let message = format!("{} performs evasive maneuvers (+{bonus} evasion)", m.name_of(request.actor));
    ActionOutcome::success(request.actor, request.kind, message)
}

/// Intercepts guided munitions only.
pub(super) fn point_defense(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let guided = request.trigger.as_ref().is_some_and(|t| t.guided);
    if !guided {
        let message = format!(
            "{}'s point defense cannot engage direct fire",
            m.name_of(request.actor)
        );
        return ActionOutcome::failure(request.actor, request.kind, message);
    }
    let message = format!("{}'s point defense intercepts the incoming munition", m.name_of(request.actor));
    ActionOutcome {
        intercepted: true,
        ..ActionOutcome::success(request.actor, request.kind, message)
    }
}

pub(super) fn emergency_shields(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let Some(stats) = m.ship_stats(request.actor) else {
        return ActionOutcome::rejected(
            request.actor,
            request.kind,
            ActionRejection::UnknownCombatant { id: request.actor },
        );
    };
    let pool = fraction_of(stats.max_shields, m.config().effects.emergency_shield_fraction);
    if pool == 0 {
        return ActionOutcome::failure(request.actor, request.kind, "no shield capacity to divert");
    }
    let effect = StatusEffect::new(StatusKind::ShieldBoost, pool as i32, Some(1))
        .from_source(request.actor, m.round());
    if !m.add_status_effect(request.actor, effect) {
        return ActionOutcome::failure(request.actor, request.kind, "status effect list is full");
    }
    let message = format!("{} raises emergency shields ({pool} pt pool)", m.name_of(request.actor));
    ActionOutcome::success(request.actor, request.kind, message)
}

/// Fires the first weapon usable in the current band back at the attacker
/// and applies damage immediately.
pub(super) fn counterfire(m: &mut CombatStateMachine, request: &ActionRequest) -> ActionOutcome {
    let target = match target_of(request) {
        Ok(target) => target,
        Err(outcome) => return outcome,
    };
    let pending = match m.roll_attack(request.actor, target, None) {
        Ok(pending) => pending,
        Err(rejection) => return ActionOutcome::rejected(request.actor, request.kind, rejection),
    };
    let weapon = pending.weapon.name.clone();
    let roll = pending.attack.clone();
    match m.apply_pending_attack(pending, false) {
        Ok(resolution) => {
            let message = match &resolution.damage {
                Some(report) => format!(
                    "{} counterfires {} at {}: {} vs TN {}, {} damage",
                    m.name_of(request.actor),
                    weapon,
                    m.name_of(target),
                    roll.total,
                    roll.target_tn,
                    report.absorption.incoming
                ),
                None => format!(
                    "{} counterfires {} at {}: {} vs TN {}, miss",
                    m.name_of(request.actor),
                    weapon,
                    m.name_of(target),
                    roll.total,
                    roll.target_tn
                ),
            };
            ActionOutcome {
                damage: resolution.damage,
                ..ActionOutcome::success(request.actor, request.kind, message).with_target(target)
            }
        }
        Err(err) => ActionOutcome::failure(request.actor, request.kind, err.to_string()),
    }
}
