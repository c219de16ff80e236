//! The interrupt window.
//!
//! A window opens after a triggering action (weapon fire) and stays open until
//! [`CombatStateMachine::resolve_reactions`]. While it exists no phase or turn
//! advances and no damage is applied. Eligible reactors queue at most one
//! reaction each; the queue resolves in order, with each reaction spending the
//! reactor's reaction budget.

use super::CombatStateMachine;
use super::actions::ExecutionContext;
use crate::action::{ActionKind, ActionRequest};
use crate::state::{
    CombatantId, InsufficientResource, ReactionQueueEntry, ReactionReport, ReactionResolution,
    ReactionWindow, ResourceKind, StateError, TriggeringAction,
};

impl CombatStateMachine {
    /// Reactions `reactor` could legally take against `trigger` right now.
    pub fn reaction_options(&self, reactor: CombatantId, trigger: &TriggeringAction) -> Vec<ActionKind> {
        let Some(trigger_def) = self.registry.get(trigger.kind) else {
            return Vec::new();
        };
        trigger_def
            .allowed_reactions
            .iter()
            .copied()
            .filter(|kind| {
                let Some(definition) = self.registry.get(*kind) else {
                    return false;
                };
                let request = reaction_request(reactor, *kind, trigger);
                self.validate(definition, &request, ExecutionContext::Reaction)
                    .is_ok()
            })
            .collect()
    }

    /// Combatants allowed to react to `trigger`: the targeted combatant, if it
    /// is still active, has a reaction left, and has at least one permitted
    /// reaction that would pass validation.
    pub fn eligible_reactors(&self, trigger: &TriggeringAction) -> Vec<CombatantId> {
        let Some(target) = trigger.target else {
            return Vec::new();
        };
        if target == trigger.actor || !self.is_active(target) {
            return Vec::new();
        }
        let has_reaction = self
            .budgets
            .get(&target)
            .is_some_and(|b| b.can_spend(ResourceKind::Reaction, 1));
        if !has_reaction || self.reaction_options(target, trigger).is_empty() {
            return Vec::new();
        }
        vec![target]
    }

    /// Opens the interrupt window for `trigger`.
    pub fn open_reaction_window(
        &mut self,
        trigger: TriggeringAction,
        eligible: Vec<CombatantId>,
    ) -> Result<(), StateError> {
        if !self.started {
            return Err(StateError::NotStarted);
        }
        if self.window.is_some() {
            return Err(StateError::ReactionWindowOpen);
        }
        if self.outcome.is_some() {
            return Err(StateError::CombatOver);
        }

        let names = eligible
            .iter()
            .map(|id| self.name_of(*id))
            .collect::<Vec<_>>()
            .join(", ");
        let message = if eligible.is_empty() {
            format!("Reaction window opens for {} (no eligible reactors)", trigger.kind)
        } else {
            format!("Reaction window opens for {}: {names} may react", trigger.kind)
        };
        tracing::debug!(trigger = %trigger.kind, eligible = eligible.len(), "reaction window opened");

        self.window = Some(ReactionWindow {
            trigger,
            eligible,
            queue: Vec::new(),
            opened_round: self.round,
            accepting: true,
        });
        self.record(message);
        Ok(())
    }

    /// Queues one reaction for an eligible reactor.
    pub fn queue_reaction(&mut self, reactor: CombatantId, kind: ActionKind) -> Result<(), StateError> {
        let max = self.config.max_reactions_per_window;
        let window = self.window.as_ref().ok_or(StateError::NoReactionWindow)?;
        if !window.accepting {
            return Err(StateError::ReactionWindowClosed);
        }
        if !window.is_eligible(reactor) {
            return Err(StateError::NotEligible { reactor });
        }
        if window.has_queued(reactor) {
            return Err(StateError::AlreadyQueued { reactor });
        }
        if window.queue.len() >= max {
            return Err(StateError::WindowFull { max });
        }
        let permitted = self
            .registry
            .get(window.trigger.kind)
            .is_some_and(|d| d.permits_reaction(kind));
        if !permitted {
            return Err(StateError::ReactionNotPermitted {
                kind: kind.to_string(),
            });
        }
        let remaining = self
            .budgets
            .get(&reactor)
            .map(|b| b.remaining(ResourceKind::Reaction))
            .unwrap_or(0);
        if remaining == 0 {
            return Err(InsufficientResource {
                kind: ResourceKind::Reaction,
                requested: 1,
                remaining,
            }
            .into());
        }

        let trigger = window.trigger.clone();
        if let Some(window) = self.window.as_mut() {
            window.queue.push(ReactionQueueEntry {
                reactor,
                kind,
                trigger,
            });
        }
        let message = format!("{} readies {kind}", self.name_of(reactor));
        self.record(message);
        Ok(())
    }

    /// Stops accepting reactions. Returns the number queued.
    pub fn close_reaction_window(&mut self) -> Result<usize, StateError> {
        let window = self.window.as_mut().ok_or(StateError::NoReactionWindow)?;
        window.accepting = false;
        Ok(window.queue.len())
    }

    /// Executes queued reactions in order and closes the window.
    ///
    /// A window with an empty queue resolves to an empty result.
    pub fn resolve_reactions(&mut self) -> Result<ReactionResolution, StateError> {
        let window = self.window.take().ok_or(StateError::NoReactionWindow)?;
        let mut reports = Vec::with_capacity(window.queue.len());
        let mut intercepted = false;

        for entry in window.queue {
            let request = reaction_request(entry.reactor, entry.kind, &entry.trigger);
            let outcome = self.perform(request, ExecutionContext::Reaction);
            intercepted |= outcome.success && outcome.intercepted;
            reports.push(ReactionReport {
                reactor: entry.reactor,
                kind: entry.kind,
                outcome,
            });
        }

        tracing::debug!(reactions = reports.len(), intercepted, "reaction window resolved");
        self.record(format!(
            "Reaction window closes ({} reaction(s))",
            reports.len()
        ));
        Ok(ReactionResolution {
            trigger: window.trigger,
            reports,
            intercepted,
        })
    }
}

fn reaction_request(reactor: CombatantId, kind: ActionKind, trigger: &TriggeringAction) -> ActionRequest {
    let request = ActionRequest::new(reactor, kind).with_trigger(trigger.clone());
    if kind == ActionKind::Counterfire {
        request.with_target(trigger.actor)
    } else {
        request
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::action::{ActionKind, ActionRequest, PendingAttack};
    use crate::engine::CombatStateMachine;
    use crate::ship::ShipSystems;
    use crate::state::{CombatantId, ResourceKind, StateError, TriggeringAction};

    const ME: CombatantId = CombatantId(1);
    const THEM: CombatantId = CombatantId(2);

    fn fire(machine: &mut CombatStateMachine, weapon: usize) -> PendingAttack {
        let outcome = machine.execute_action(
            ActionRequest::new(ME, ActionKind::FireWeapon)
                .with_target(THEM)
                .with_weapon(weapon),
        );
        assert!(outcome.success, "{}", outcome.message);
        let pending = outcome.pending_attack.unwrap();
        let trigger = pending.trigger();
        let eligible = machine.eligible_reactors(&trigger);
        machine.open_reaction_window(trigger, eligible).unwrap();
        pending
    }

    #[test]
    fn empty_window_resolves_empty() {
        let mut machine = default_duel();
        let trigger = TriggeringAction {
            actor: ME,
            kind: ActionKind::Scan,
            target: Some(THEM),
            weapon: None,
            guided: false,
            attack: None,
        };
        assert!(machine.eligible_reactors(&trigger).is_empty());
        machine.open_reaction_window(trigger, Vec::new()).unwrap();
        assert_eq!(machine.close_reaction_window().unwrap(), 0);
        let resolution = machine.resolve_reactions().unwrap();
        assert!(resolution.is_empty());
        assert!(!resolution.intercepted);
        assert!(machine.reaction_window().is_none());
    }

    #[test]
    fn only_one_window_at_a_time() {
        let mut machine = default_duel();
        fire(&mut machine, 0);
        let trigger = machine.reaction_window().unwrap().trigger.clone();
        assert_eq!(
            machine.open_reaction_window(trigger, Vec::new()),
            Err(StateError::ReactionWindowOpen)
        );
    }

    #[test]
    fn evasive_maneuvers_flip_a_hit() {
        // 13 + 2 + 1 + 1 = 17 vs TN 15.
        let mut aegis = ship("Aegis", 20);
        aegis.queue_d20([13]);
        let mut machine = duel(aegis, ship("Marauder", 1));

        let pending = fire(&mut machine, 0);
        assert!(pending.attack.hit);
        assert_eq!(machine.reaction_window().unwrap().eligible, vec![THEM]);

        machine.queue_reaction(THEM, ActionKind::EvasiveManeuvers).unwrap();
        let resolution = machine.resolve_reactions().unwrap();
        assert_eq!(resolution.reports.len(), 1);
        assert!(resolution.reports[0].outcome.success);
        assert!(!machine.can_perform_action(THEM, ResourceKind::Reaction));

        let result = machine.apply_pending_attack(pending, resolution.intercepted).unwrap();
        assert_eq!(result.attack.target_tn, 19);
        assert!(!result.hit());
        assert!(result.damage.is_none());
    }

    #[test]
    fn point_defense_intercepts_guided_fire() {
        let mut aegis = ship("Aegis", 20);
        aegis.queue_d20([18]);
        let mut machine = duel(aegis, ship("Marauder", 1));

        let pending = fire(&mut machine, 1);
        assert!(pending.weapon.guided);
        machine.queue_reaction(THEM, ActionKind::PointDefense).unwrap();
        let resolution = machine.resolve_reactions().unwrap();
        assert!(resolution.intercepted);

        let result = machine.apply_pending_attack(pending, resolution.intercepted).unwrap();
        assert!(!result.hit());
        assert_eq!(machine.combatant(THEM).unwrap().ship.current_shields(), 40);
        assert!(machine.log().contains("intercept"));
    }

    #[test]
    fn point_defense_fails_against_direct_fire() {
        let mut aegis = ship("Aegis", 20);
        aegis.queue_d20([18]);
        let mut machine = duel(aegis, ship("Marauder", 1));

        fire(&mut machine, 0);
        machine.queue_reaction(THEM, ActionKind::PointDefense).unwrap();
        let resolution = machine.resolve_reactions().unwrap();
        assert!(!resolution.intercepted);
        assert!(!resolution.reports[0].outcome.success);
    }

    #[test]
    fn counterfire_damages_the_attacker_immediately() {
        let mut marauder = ship("Marauder", 1);
        marauder.queue_d20([18]);
        marauder.queue_damage([9]);
        let mut machine = duel(ship("Aegis", 20), marauder);

        fire(&mut machine, 0);
        machine.queue_reaction(THEM, ActionKind::Counterfire).unwrap();
        let resolution = machine.resolve_reactions().unwrap();
        let report = &resolution.reports[0].outcome;
        assert!(report.success, "{}", report.message);
        assert_eq!(report.target, Some(ME));
        assert_eq!(machine.combatant(ME).unwrap().ship.current_shields(), 31);
    }

    #[test]
    fn queue_rules_are_enforced() {
        let mut machine = default_duel();
        fire(&mut machine, 0);

        assert_eq!(
            machine.queue_reaction(ME, ActionKind::EvasiveManeuvers),
            Err(StateError::NotEligible { reactor: ME })
        );
        assert!(matches!(
            machine.queue_reaction(THEM, ActionKind::Evade),
            Err(StateError::ReactionNotPermitted { .. })
        ));
        machine.queue_reaction(THEM, ActionKind::EmergencyShields).unwrap();
        assert_eq!(
            machine.queue_reaction(THEM, ActionKind::EvasiveManeuvers),
            Err(StateError::AlreadyQueued { reactor: THEM })
        );
        machine.close_reaction_window().unwrap();
        assert_eq!(
            machine.queue_reaction(THEM, ActionKind::EvasiveManeuvers),
            Err(StateError::ReactionWindowClosed)
        );
    }

    #[test]
    fn spent_reaction_makes_target_ineligible() {
        let mut machine = default_duel();
        machine
            .spend_action(THEM, ResourceKind::Reaction, "EvasiveManeuvers", 1)
            .unwrap();
        let pending = machine
            .roll_attack(ME, THEM, Some(0))
            .unwrap();
        assert!(machine.eligible_reactors(&pending.trigger()).is_empty());
    }
}
