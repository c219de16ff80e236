//! Phase order, turn advancement, and rounds.

use super::{CombatStateMachine, InitiativeEntry};
use crate::state::{ActionBudget, CombatantId, StateError, TurnPhase};

impl CombatStateMachine {
    /// Rolls initiative once for every combatant and fixes the order:
    /// highest roll first, then higher initiative stat, then lower id.
    pub(super) fn roll_initiative(&mut self) {
        let mut order: Vec<InitiativeEntry> = self
            .combatants
            .values_mut()
            .map(|c| {
                let roll = c.ship.roll_initiative();
                InitiativeEntry {
                    id: c.id,
                    roll,
                    initiative: c.ship.combat_stats().initiative,
                }
            })
            .collect();
        order.sort_by(|a, b| {
            b.roll
                .cmp(&a.roll)
                .then(b.initiative.cmp(&a.initiative))
                .then(a.id.cmp(&b.id))
        });
        self.initiative = order;
    }

    fn ensure_advanceable(&self) -> Result<(), StateError> {
        if !self.started {
            return Err(StateError::NotStarted);
        }
        if self.window.is_some() {
            return Err(StateError::ReactionWindowOpen);
        }
        Ok(())
    }

    /// Advances to the next phase of the current turn.
    ///
    /// `MOVEMENT -> ACTION -> BONUS_ACTION -> END_TURN`; from END_TURN this
    /// advances to the next combatant's MOVEMENT phase.
    pub fn next_phase(&mut self) -> Result<TurnPhase, StateError> {
        self.ensure_advanceable()?;
        match self.phase.next() {
            Some(phase) => {
                self.phase = phase;
                tracing::debug!(round = self.round, %phase, "phase advanced");
                Ok(phase)
            }
            None => {
                self.advance_turn()?;
                Ok(self.phase)
            }
        }
    }

    /// Moves to the next active combatant in initiative order and resets its
    /// budget. Wrapping past the end of the order starts a new round.
    pub fn advance_turn(&mut self) -> Result<CombatantId, StateError> {
        self.ensure_advanceable()?;
        if self.outcome.is_some() {
            return Err(StateError::CombatOver);
        }

        let len = self.initiative.len();
        let mut index = self.turn_index;
        let mut wrapped = false;
        for _ in 0..len {
            index += 1;
            if index >= len {
                index = 0;
                wrapped = true;
            }
            if self.is_active(self.initiative[index].id) {
                break;
            }
        }

        if wrapped {
            self.advance_round()?;
        } else {
            self.turn_index = index;
            self.phase = TurnPhase::Movement;
            self.reset_budget(self.initiative[index].id);
        }

        let current = self.initiative[self.turn_index].id;
        tracing::info!(round = self.round, combatant = %current, "turn started");
        self.record(format!("Round {}: {}'s turn", self.round, self.name_of(current)));
        Ok(current)
    }

    /// Increments the round, ticks every status effect once, and hands the
    /// turn to the first active combatant with a fresh budget.
    pub fn advance_round(&mut self) -> Result<u32, StateError> {
        self.ensure_advanceable()?;
        self.round += 1;

        let mut expired = Vec::new();
        for (id, effects) in self.effects.iter_mut() {
            for effect in effects.tick() {
                expired.push((*id, effect));
            }
        }
        for (id, effect) in expired {
            let message = format!("{}'s {} effect expires", self.name_of(id), effect.kind);
            self.record(message);
        }

        let first = self
            .initiative
            .iter()
            .position(|e| self.is_active(e.id))
            .unwrap_or(0);
        self.turn_index = first;
        self.phase = TurnPhase::Movement;
        if let Some(entry) = self.initiative.get(first) {
            self.reset_budget(entry.id);
        }

        tracing::info!(round = self.round, "round started");
        self.record(format!("Round {} begins", self.round));
        Ok(self.round)
    }

    fn reset_budget(&mut self, id: CombatantId) {
        let movement = self
            .combatants
            .get(&id)
            .map(|c| c.ship.combat_stats().speed)
            .unwrap_or(0);
        let grant = self.config.budget;
        self.budgets
            .entry(id)
            .and_modify(|b| b.reset(&grant, movement))
            .or_insert_with(|| ActionBudget::granted(&grant, movement));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::state::{CombatantId, ResourceKind, StateError, TurnPhase, TriggeringAction};
    use crate::action::ActionKind;

    #[test]
    fn initiative_orders_by_roll() {
        let machine = duel(ship("Slow", 3), ship("Fast", 18));
        let order: Vec<_> = machine.initiative_order().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![CombatantId(2), CombatantId(1)]);
        assert_eq!(machine.current(), Some(CombatantId(2)));
        assert_eq!(machine.round(), 1);
    }

    #[test]
    fn phases_run_in_order_then_hand_over() {
        let mut machine = default_duel();
        assert_eq!(machine.phase(), TurnPhase::Movement);
        assert_eq!(machine.next_phase().unwrap(), TurnPhase::Action);
        assert_eq!(machine.next_phase().unwrap(), TurnPhase::BonusAction);
        assert_eq!(machine.next_phase().unwrap(), TurnPhase::EndTurn);
        assert_eq!(machine.current(), Some(CombatantId(1)));

        assert_eq!(machine.next_phase().unwrap(), TurnPhase::Movement);
        assert_eq!(machine.current(), Some(CombatantId(2)));
        assert_eq!(machine.round(), 1);
    }

    #[test]
    fn round_increments_exactly_on_wrap() {
        let mut machine = default_duel();
        machine.advance_turn().unwrap();
        assert_eq!(machine.round(), 1);
        machine.advance_turn().unwrap();
        assert_eq!(machine.round(), 2);
        assert_eq!(machine.current(), Some(CombatantId(1)));
        machine.advance_turn().unwrap();
        assert_eq!(machine.round(), 2);
    }

    #[test]
    fn budget_resets_at_own_turn() {
        let mut machine = default_duel();
        let me = CombatantId(1);
        machine.spend_action(me, ResourceKind::Action, "FireWeapon", 1).unwrap();
        assert!(!machine.can_perform_action(me, ResourceKind::Action));
        machine.advance_turn().unwrap();
        assert!(!machine.can_perform_action(me, ResourceKind::Action));
        machine.advance_turn().unwrap();
        assert!(machine.can_perform_action(me, ResourceKind::Action));
    }

    #[test]
    fn cannot_advance_while_window_open() {
        let mut machine = default_duel();
        let trigger = TriggeringAction {
            actor: CombatantId(1),
            kind: ActionKind::FireWeapon,
            target: Some(CombatantId(2)),
            weapon: Some(0),
            guided: false,
            attack: None,
        };
        machine.open_reaction_window(trigger, Vec::new()).unwrap();
        assert_eq!(machine.next_phase(), Err(StateError::ReactionWindowOpen));
        assert_eq!(machine.advance_turn(), Err(StateError::ReactionWindowOpen));
        machine.resolve_reactions().unwrap();
        assert!(machine.next_phase().is_ok());
    }

    #[test]
    fn disabled_combatants_are_skipped() {
        let mut machine = crate::engine::CombatStateMachine::begin(
            crate::config::CombatConfig::default(),
            [
                combatant(1, "federation", ship("A", 20)),
                combatant(2, "federation", ship("B", 15)),
                combatant(3, "raiders", ship("C", 10)),
            ],
        )
        .unwrap();
        machine.apply_damage(CombatantId(2), 1_000, None).unwrap();
        let next = machine.advance_turn().unwrap();
        assert_eq!(next, CombatantId(3));
    }

    #[test]
    fn inconsistent_lane_geometry_refuses_to_begin() {
        let config = crate::config::CombatConfig {
            lane_count: 4,
            near_side_max: 4,
            ..Default::default()
        };
        let result = crate::engine::CombatStateMachine::begin(
            config,
            [
                combatant(1, "federation", ship("A", 20)),
                combatant(2, "raiders", ship("B", 10)),
            ],
        );
        assert!(matches!(result, Err(StateError::Config(_))));
    }
}
