//! Read-only projection for presentation layers.

use super::{CombatOutcome, CombatStateMachine};
use crate::action::{ActionKind, ActionRejection};
use crate::positioning::DistanceBand;
use crate::state::{
    BudgetCounts, CombatLogEntry, CombatantId, CombatantStatus, Controller, Faction, StatusEffect,
    TurnPhase,
};

/// Per-combatant row of a [`CombatView`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantView {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    pub controller: Controller,
    pub status: CombatantStatus,
    pub hull: u32,
    pub max_hull: u32,
    pub shields: u32,
    pub max_shields: u32,
    pub lane: u8,
    /// Band to the current combatant; `None` for the current combatant itself.
    pub band_to_current: Option<DistanceBand>,
    pub budget: Option<BudgetCounts>,
    pub effects: Vec<StatusEffect>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatView {
    pub round: u32,
    pub phase: TurnPhase,
    pub current: Option<CombatantId>,
    pub combatants: Vec<CombatantView>,
    pub window_open: bool,
    pub log_tail: Vec<CombatLogEntry>,
    pub outcome: Option<CombatOutcome>,
}

/// Whether an ability can be used right now, and why not.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityAvailability {
    pub kind: ActionKind,
    pub available: bool,
    pub reason: Option<String>,
    pub cooldown_rounds_remaining: u32,
    pub uses_remaining: Option<u32>,
}

impl CombatStateMachine {
    /// Snapshot of what a UI needs to draw the current state, with the last
    /// `log_tail` log entries.
    pub fn view(&self, log_tail: usize) -> CombatView {
        let current = self.current();
        let combatants = self
            .roster
            .iter()
            .filter_map(|id| self.combatants.get(id))
            .map(|c| {
                let stats = c.ship.combat_stats();
                CombatantView {
                    id: c.id,
                    name: c.name.clone(),
                    faction: c.faction.clone(),
                    controller: c.controller,
                    status: c.status,
                    hull: c.ship.current_hull(),
                    max_hull: stats.max_hull,
                    shields: c.ship.current_shields(),
                    max_shields: stats.max_shields,
                    lane: self.positions.lane(c.id),
                    band_to_current: current
                        .filter(|cur| *cur != c.id)
                        .map(|cur| self.positions.band(cur, c.id)),
                    budget: self.budgets.get(&c.id).map(|b| b.remaining_counts()),
                    effects: self
                        .effects
                        .get(&c.id)
                        .map(|e| e.iter().copied().collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        CombatView {
            round: self.round,
            phase: self.phase,
            current,
            combatants,
            window_open: self.window.is_some(),
            log_tail: self.log.tail(log_tail),
            outcome: self.outcome.clone(),
        }
    }

    /// Availability of one ability for `id`, including cooldown and budget.
    ///
    /// Target-dependent checks (range, target validity) are not evaluated.
    pub fn ability_availability(&self, id: CombatantId, kind: ActionKind) -> AbilityAvailability {
        let info = self
            .registry
            .get(kind)
            .and_then(|d| d.cooldown)
            .map(|rule| self.cooldowns.info(id, kind, &rule, self.round))
            .unwrap_or_default();
        let mut availability = AbilityAvailability {
            kind,
            available: false,
            reason: None,
            cooldown_rounds_remaining: info.rounds_remaining,
            uses_remaining: info.uses_remaining,
        };
        match self.availability_blocker(id, kind) {
            Some(reason) => availability.reason = Some(reason),
            None => availability.available = true,
        }
        availability
    }

    fn availability_blocker(&self, id: CombatantId, kind: ActionKind) -> Option<String> {
        let Some(definition) = self.registry.get(kind) else {
            return Some(ActionRejection::UnknownAction { action: kind }.to_string());
        };
        if self.outcome.is_some() {
            return Some(ActionRejection::CombatOver.to_string());
        }
        let Some(combatant) = self.combatants.get(&id) else {
            return Some(ActionRejection::UnknownCombatant { id }.to_string());
        };
        if !combatant.is_active() {
            return Some(ActionRejection::Inactive { id }.to_string());
        }
        if !combatant.ship.capabilities().contains(definition.requires) {
            return Some(format!("ship lacks the systems for {kind}"));
        }

        match &self.window {
            Some(window) if kind.is_reaction() => {
                if !window.is_eligible(id) {
                    return Some(format!("{} is not eligible to react", self.name_of(id)));
                }
                let permitted = self
                    .registry
                    .get(window.trigger.kind)
                    .is_some_and(|d| d.permits_reaction(kind));
                if !permitted {
                    return Some(format!("{kind} cannot answer {}", window.trigger.kind));
                }
            }
            Some(_) => {
                return Some(ActionRejection::WindowOpen { action: kind }.to_string());
            }
            None if kind.is_reaction() => {
                return Some(ActionRejection::ReactionOutsideWindow { action: kind }.to_string());
            }
            None => {
                if self.current() != Some(id) {
                    return Some(ActionRejection::NotYourTurn { action: kind }.to_string());
                }
            }
        }

        let amount = definition.cost_amount(self.config.lane_step_cost);
        let remaining = self
            .budgets
            .get(&id)
            .map(|b| b.remaining(definition.cost))
            .unwrap_or(0);
        if remaining < amount {
            return Some(format!("needs {amount} {}, {remaining} remaining", definition.cost));
        }

        if let Some(rule) = &definition.cooldown
            && let Err(blocked) = self.cooldowns.check(id, kind, rule, self.round)
        {
            return Some(ActionRejection::from_cooldown(kind, blocked).to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::action::ActionRequest;

    const ME: CombatantId = CombatantId(1);
    const THEM: CombatantId = CombatantId(2);

    #[test]
    fn view_reports_meters_and_bands() {
        let mut machine = default_duel();
        machine.apply_damage(THEM, 50, Some(ME)).unwrap();
        let view = machine.view(3);

        assert_eq!(view.current, Some(ME));
        assert_eq!(view.round, 1);
        assert!(!view.window_open);
        assert_eq!(view.log_tail.len(), 3);

        let me = &view.combatants[0];
        assert_eq!(me.band_to_current, None);
        assert_eq!(me.lane, 2);
        let them = &view.combatants[1];
        assert_eq!(them.band_to_current, Some(DistanceBand::Long));
        assert_eq!((them.shields, them.hull), (0, 90));
        assert_eq!(them.budget.map(|b| b.reactions), Some(1));
    }

    #[test]
    fn availability_tracks_cooldowns() {
        let mut machine = default_duel();
        let before = machine.ability_availability(ME, ActionKind::BoostShields);
        assert!(before.available);

        machine.execute_action(ActionRequest::new(ME, ActionKind::BoostShields));
        let after = machine.ability_availability(ME, ActionKind::BoostShields);
        assert!(!after.available);
        assert_eq!(after.cooldown_rounds_remaining, 2);
        assert!(after.reason.is_some());
    }

    #[test]
    fn reactions_unavailable_outside_window() {
        let machine = default_duel();
        let info = machine.ability_availability(THEM, ActionKind::PointDefense);
        assert!(!info.available);
        assert_eq!(info.uses_remaining, Some(2));
    }
}
