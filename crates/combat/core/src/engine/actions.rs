//! Action validation, spending, and execution.

use super::CombatStateMachine;
use crate::action::{
    ActionDefinition, ActionKind, ActionOutcome, ActionRejection, ActionRequest,
};
use crate::positioning::StepDirection;
use crate::ship::{Capabilities, Weapon};
use crate::state::{CombatantId, InsufficientResource, ResourceKind, StateError};

/// Where a request is being executed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ExecutionContext {
    /// The current combatant acting on its own turn.
    Turn,
    /// A queued reaction being resolved.
    Reaction,
}

fn capability_name(caps: Capabilities) -> String {
    let names: Vec<&str> = caps.iter_names().map(|(name, _)| name).collect();
    names.join("|").to_lowercase()
}

impl CombatStateMachine {
    // ========================================================================
    // Budget gate
    // ========================================================================

    /// Whether `id` has at least one unit of `kind` left.
    ///
    /// Reactions additionally require that an open window can accept more.
    pub fn can_perform_action(&self, id: CombatantId, kind: ResourceKind) -> bool {
        let Some(budget) = self.budgets.get(&id) else {
            return false;
        };
        if !budget.can_spend(kind, 1) {
            return false;
        }
        if kind == ResourceKind::Reaction
            && let Some(window) = &self.window
        {
            return window.queue.len() < self.config.max_reactions_per_window;
        }
        true
    }

    /// Deducts `cost` units of `kind` from `id`'s budget and logs the spend.
    pub fn spend_action(
        &mut self,
        id: CombatantId,
        kind: ResourceKind,
        name: &str,
        cost: u32,
    ) -> Result<(), StateError> {
        let budget = self
            .budgets
            .get_mut(&id)
            .ok_or(StateError::UnknownCombatant { id })?;
        budget.spend(kind, name, cost)?;
        let remaining = budget.remaining(kind);
        if cost > 0 {
            let message = format!(
                "{} spends {cost} {kind} on {name} ({remaining} left)",
                self.name_of(id)
            );
            self.record(message);
        }
        Ok(())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Validates, spends, and runs an action for the current combatant.
    ///
    /// Invalid input never errors: the outcome carries `success: false` and the
    /// rejection reason.
    ///
    /// The cost class is checked against the remaining budget, not against
    /// [`Self::phase`]. Ordering spends by phase is the turn-flow
    /// orchestrator's job; the stepped flow rejects an out-of-order step with
    /// a phase mismatch.
    pub fn execute_action(&mut self, request: ActionRequest) -> ActionOutcome {
        self.perform(request, ExecutionContext::Turn)
    }

    pub(super) fn perform(&mut self, request: ActionRequest, context: ExecutionContext) -> ActionOutcome {
        let Some(definition) = self.registry.get(request.kind).copied() else {
            return self.reject(
                &request,
                ActionRejection::UnknownAction {
                    action: request.kind,
                },
            );
        };

        if let Err(rejection) = self.validate(&definition, &request, context) {
            return self.reject(&request, rejection);
        }

        let amount = definition.cost_amount(self.config.lane_step_cost);
        if let Err(err) = self.spend_action(request.actor, definition.cost, definition.name, amount) {
            let rejection = match err {
                StateError::InsufficientResource(shortfall) => {
                    ActionRejection::from_budget(request.kind, shortfall)
                }
                other => ActionRejection::InsufficientBudget {
                    action: request.kind,
                    reason: other.to_string(),
                },
            };
            return self.reject(&request, rejection);
        }
        if let Some(rule) = definition.cooldown {
            self.cooldowns
                .mark_used(request.actor, request.kind, &rule, self.round);
        }

        let outcome = (definition.effect)(self, &request);
        if outcome.success {
            tracing::debug!(actor = %request.actor, action = %request.kind, "{}", outcome.message);
        } else {
            tracing::warn!(actor = %request.actor, action = %request.kind, "{}", outcome.message);
        }
        self.record(outcome.message.clone());
        outcome
    }

    fn reject(&mut self, request: &ActionRequest, rejection: ActionRejection) -> ActionOutcome {
        tracing::warn!(
            actor = %request.actor,
            action = %request.kind,
            reason = %rejection,
            "action rejected"
        );
        let message = format!("{} cannot {}: {rejection}", self.name_of(request.actor), request.kind);
        self.record(message);
        ActionOutcome::rejected(request.actor, request.kind, rejection)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    pub(super) fn validate(
        &self,
        definition: &ActionDefinition,
        request: &ActionRequest,
        context: ExecutionContext,
    ) -> Result<(), ActionRejection> {
        let kind = request.kind;
        if self.outcome.is_some() {
            return Err(ActionRejection::CombatOver);
        }
        let actor = self
            .combatants
            .get(&request.actor)
            .ok_or(ActionRejection::UnknownCombatant { id: request.actor })?;
        if !actor.is_active() {
            return Err(ActionRejection::Inactive { id: request.actor });
        }

        match context {
            ExecutionContext::Turn => {
                if kind.is_reaction() {
                    return Err(ActionRejection::ReactionOutsideWindow { action: kind });
                }
                if self.window.is_some() {
                    return Err(ActionRejection::WindowOpen { action: kind });
                }
                if self.current() != Some(request.actor) {
                    return Err(ActionRejection::NotYourTurn { action: kind });
                }
            }
            ExecutionContext::Reaction => {
                if !kind.is_reaction() {
                    return Err(ActionRejection::WindowOpen { action: kind });
                }
            }
        }

        let caps = actor.ship.capabilities();
        if !caps.contains(definition.requires) {
            return Err(ActionRejection::MissingCapability {
                action: kind,
                capability: capability_name(definition.requires.difference(caps)),
            });
        }

        if definition.requires_target {
            let target_id = request
                .target
                .ok_or(ActionRejection::MissingTarget { action: kind })?;
            let target = self
                .combatants
                .get(&target_id)
                .filter(|t| t.is_active() && t.id != actor.id)
                .ok_or(ActionRejection::InvalidTarget {
                    action: kind,
                    target: target_id,
                })?;
            if definition.hostile_target && !actor.is_enemy_of(target) {
                return Err(ActionRejection::InvalidTarget {
                    action: kind,
                    target: target_id,
                });
            }

            match kind {
                ActionKind::FireWeapon => {
                    self.select_weapon(request.actor, target_id, request.weapon)?;
                }
                ActionKind::Counterfire => {
                    self.select_weapon(request.actor, target_id, None)?;
                }
                ActionKind::MoveCloser | ActionKind::MoveFarther => {
                    let direction = if kind == ActionKind::MoveCloser {
                        StepDirection::Closer
                    } else {
                        StepDirection::Farther
                    };
                    if !self
                        .positions
                        .preview_step(request.actor, target_id, direction)
                        .moved
                    {
                        return Err(ActionRejection::MovementBlocked { action: kind });
                    }
                }
                _ => {}
            }
        }

        let amount = definition.cost_amount(self.config.lane_step_cost);
        let budget = self
            .budgets
            .get(&request.actor)
            .ok_or(ActionRejection::UnknownCombatant { id: request.actor })?;
        if !budget.can_spend(definition.cost, amount) {
            let shortfall = InsufficientResource {
                kind: definition.cost,
                requested: amount,
                remaining: budget.remaining(definition.cost),
            };
            return Err(ActionRejection::from_budget(kind, shortfall));
        }

        if let Some(rule) = &definition.cooldown {
            self.cooldowns
                .check(request.actor, kind, rule, self.round)
                .map_err(|blocked| ActionRejection::from_cooldown(kind, blocked))?;
        }
        Ok(())
    }

    /// Picks the requested weapon, or the first weapon usable at the current band.
    pub(super) fn select_weapon(
        &self,
        attacker: CombatantId,
        target: CombatantId,
        requested: Option<usize>,
    ) -> Result<(usize, Weapon), ActionRejection> {
        let stats = self
            .ship_stats(attacker)
            .ok_or(ActionRejection::UnknownCombatant { id: attacker })?;
        if stats.weapons.is_empty() {
            return Err(ActionRejection::NoWeapon);
        }
        let band = self.positions.band(attacker, target);
        match requested {
            Some(index) => {
                let weapon = stats
                    .weapons
                    .get(index)
                    .cloned()
                    .ok_or(ActionRejection::UnknownWeapon { index })?;
                if !weapon.can_fire_at(band) {
                    return Err(ActionRejection::WeaponOutOfBand {
                        weapon: weapon.name,
                        band,
                    });
                }
                Ok((index, weapon))
            }
            None => stats
                .weapons
                .iter()
                .enumerate()
                .find(|(_, w)| w.can_fire_at(band))
                .map(|(i, w)| (i, w.clone()))
                .ok_or_else(|| ActionRejection::WeaponOutOfBand {
                    weapon: stats.weapons[0].name.clone(),
                    band,
                }),
        }
    }

    // ========================================================================
    // Availability
    // ========================================================================

    /// Action set a combatant's installed systems allow right now.
    ///
    /// With a reaction window open, only reactions permitted by the trigger
    /// are listed, and only for eligible reactors. Otherwise reactions are
    /// excluded. Budget and cooldown are not considered; see
    /// [`Self::ability_availability`].
    pub fn available_actions(&self, id: CombatantId) -> Vec<ActionKind> {
        let Some(combatant) = self.combatants.get(&id) else {
            return Vec::new();
        };
        if !combatant.is_active() {
            return Vec::new();
        }
        let caps = combatant.ship.capabilities();

        match &self.window {
            Some(window) => {
                if !window.is_eligible(id) {
                    return Vec::new();
                }
                let Some(trigger) = self.registry.get(window.trigger.kind) else {
                    return Vec::new();
                };
                trigger
                    .allowed_reactions
                    .iter()
                    .copied()
                    .filter(|kind| {
                        self.registry
                            .get(*kind)
                            .is_some_and(|d| caps.contains(d.requires))
                    })
                    .collect()
            }
            None => self
                .registry
                .iter()
                .filter(|d| !d.kind.is_reaction() && caps.contains(d.requires))
                .map(|d| d.kind)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::action::{ActionKind, ActionRejection, ActionRequest};
    use crate::ship::ComponentKind;
    use crate::state::{CombatantId, ResourceKind, TurnPhase};

    const ME: CombatantId = CombatantId(1);
    const THEM: CombatantId = CombatantId(2);

    #[test]
    fn firing_spends_the_only_action() {
        let mut machine = default_duel();
        assert!(machine.can_perform_action(ME, ResourceKind::Action));
        let outcome = machine.execute_action(
            ActionRequest::new(ME, ActionKind::FireWeapon)
                .with_target(THEM)
                .with_weapon(0),
        );
        assert!(outcome.success, "{}", outcome.message);
        assert!(outcome.awaits_damage());
        assert!(!machine.can_perform_action(ME, ResourceKind::Action));

        let again = machine.execute_action(
            ActionRequest::new(ME, ActionKind::FireWeapon).with_target(THEM),
        );
        assert!(!again.success);
        match again.rejection {
            Some(ActionRejection::InsufficientBudget { action, reason }) => {
                assert_eq!(action, ActionKind::FireWeapon);
                assert!(reason.ends_with("0 remaining"), "{reason}");
            }
            other => panic!("unexpected rejection {other:?}"),
        }
    }

    #[test]
    fn cost_class_is_gated_by_budget_not_phase() {
        let mut machine = default_duel();
        assert_eq!(machine.phase(), TurnPhase::Movement);

        let outcome = machine.execute_action(
            ActionRequest::new(ME, ActionKind::FireWeapon)
                .with_target(THEM)
                .with_weapon(0),
        );
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(machine.phase(), TurnPhase::Movement);
        assert!(!machine.can_perform_action(ME, ResourceKind::Action));
    }

    #[test]
    fn missing_target_is_a_failed_outcome_not_an_error() {
        let mut machine = default_duel();
        let outcome = machine.execute_action(ActionRequest::new(ME, ActionKind::FireWeapon));
        assert!(!outcome.success);
        assert_eq!(
            outcome.rejection,
            Some(ActionRejection::MissingTarget {
                action: ActionKind::FireWeapon
            })
        );
        assert!(machine.can_perform_action(ME, ResourceKind::Action));
    }

    #[test]
    fn weapon_without_band_entry_is_rejected() {
        let mut brawler = spec("Brawler");
        brawler.weapons = vec![crate::ship::Weapon::centered_on(
            "blaster",
            crate::ship::DamageDice::new(2, 6, 0),
            crate::positioning::DistanceBand::PointBlank,
        )];
        let brawler = crate::ship::StandardShip::from_spec(brawler, 1).with_fixed_initiative(20);
        let mut machine = duel(brawler, ship("Marauder", 1));

        // Lanes 2 vs 7 is LONG; the blaster has no entry there.
        let outcome = machine.execute_action(
            ActionRequest::new(ME, ActionKind::FireWeapon)
                .with_target(THEM)
                .with_weapon(0),
        );
        assert!(matches!(
            outcome.rejection,
            Some(ActionRejection::WeaponOutOfBand { .. })
        ));
        assert!(machine.can_perform_action(ME, ResourceKind::Action));
    }

    #[test]
    fn movement_consumes_points_one_lane_at_a_time() {
        let mut machine = default_duel();
        let first = machine.execute_action(ActionRequest::new(ME, ActionKind::MoveCloser).with_target(THEM));
        assert!(first.success);
        assert_eq!(first.movement.unwrap().new_distance, 400);
        machine.execute_action(ActionRequest::new(ME, ActionKind::MoveCloser).with_target(THEM));
        let third = machine.execute_action(ActionRequest::new(ME, ActionKind::MoveCloser).with_target(THEM));
        assert!(!third.success);
        assert_eq!(machine.budget(ME).unwrap().remaining(ResourceKind::Movement), 0);
    }

    #[test]
    fn acting_out_of_turn_is_rejected() {
        let mut machine = default_duel();
        let outcome = machine.execute_action(ActionRequest::new(THEM, ActionKind::Evade));
        assert!(matches!(outcome.rejection, Some(ActionRejection::NotYourTurn { .. })));
    }

    #[test]
    fn reactions_need_a_window() {
        let mut machine = default_duel();
        let outcome = machine.execute_action(ActionRequest::new(ME, ActionKind::EvasiveManeuvers));
        assert!(matches!(
            outcome.rejection,
            Some(ActionRejection::ReactionOutsideWindow { .. })
        ));
    }

    #[test]
    fn bonus_action_cooldown_blocks_reuse() {
        let mut machine = default_duel();
        let outcome = machine.execute_action(ActionRequest::new(ME, ActionKind::BoostShields));
        assert!(outcome.success);
        machine.advance_turn().unwrap();
        machine.advance_turn().unwrap();
        // Round 2: two-round cooldown still running.
        let outcome = machine.execute_action(ActionRequest::new(ME, ActionKind::BoostShields));
        assert!(matches!(outcome.rejection, Some(ActionRejection::OnCooldown { .. })));
    }

    #[test]
    fn available_actions_follow_capabilities() {
        let mut spec = spec("Hauler");
        spec.components = vec![ComponentKind::Engine];
        let hauler = crate::ship::StandardShip::from_spec(spec, 1).with_fixed_initiative(20);
        let machine = duel(hauler, ship("Marauder", 1));
        let actions = machine.available_actions(ME);
        assert!(actions.contains(&ActionKind::Evade));
        assert!(actions.contains(&ActionKind::MoveCloser));
        assert!(!actions.contains(&ActionKind::FireWeapon));
        assert!(!actions.contains(&ActionKind::Scan));
        assert!(!actions.contains(&ActionKind::EvasiveManeuvers));
    }
}
