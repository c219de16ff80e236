//! Turn plans produced by the decision engine (or submitted by a player).

use combat_core::{ActionKind, ActionRequest, CombatantId};
use serde::{Deserialize, Serialize};

use super::posture::Posture;
use super::risk::Strategy;

/// One action slot of a plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub kind: ActionKind,
    #[serde(default)]
    pub target: Option<CombatantId>,
    #[serde(default)]
    pub weapon: Option<usize>,
}

impl PlannedAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            target: None,
            weapon: None,
        }
    }

    pub fn at(kind: ActionKind, target: CombatantId) -> Self {
        Self {
            target: Some(target),
            ..Self::new(kind)
        }
    }

    pub fn fire(target: CombatantId, weapon: usize) -> Self {
        Self {
            weapon: Some(weapon),
            ..Self::at(ActionKind::FireWeapon, target)
        }
    }

    pub fn request(&self, actor: CombatantId) -> ActionRequest {
        let mut request = ActionRequest::new(actor, self.kind);
        if let Some(target) = self.target {
            request = request.with_target(target);
        }
        if let Some(weapon) = self.weapon {
            request = request.with_weapon(weapon);
        }
        request
    }
}

/// Accepted negotiation outcome to apply at the start of the turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub kind: Strategy,
    pub counterpart: Option<CombatantId>,
}

/// Everything a combatant intends to do this turn, in phase order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionPlan {
    pub actor: CombatantId,
    pub round: u32,
    pub strategy: Strategy,
    #[serde(default)]
    pub target: Option<CombatantId>,
    #[serde(default)]
    pub movement: Option<PlannedAction>,
    #[serde(default)]
    pub actions: Vec<PlannedAction>,
    #[serde(default)]
    pub bonus_actions: Vec<PlannedAction>,
    #[serde(default)]
    pub final_movement: Option<PlannedAction>,
    #[serde(default)]
    pub agreement: Option<Agreement>,
    #[serde(default)]
    pub posture: Option<Posture>,
    /// One line per planning step.
    #[serde(default)]
    pub reasoning: Vec<String>,
    /// Produced by the planning fallback rather than the full pipeline.
    #[serde(default)]
    pub fallback: bool,
}

impl DecisionPlan {
    pub fn new(actor: CombatantId, round: u32, strategy: Strategy) -> Self {
        Self {
            actor,
            round,
            strategy,
            target: None,
            movement: None,
            actions: Vec::new(),
            bonus_actions: Vec::new(),
            final_movement: None,
            agreement: None,
            posture: None,
            reasoning: Vec::new(),
            fallback: false,
        }
    }

    /// Defensive stand with no actions.
    pub fn fallback(actor: CombatantId, round: u32, reason: impl Into<String>) -> Self {
        let mut plan = Self::new(actor, round, Strategy::DefensiveStand);
        plan.fallback = true;
        plan.reasoning.push(format!("FALLBACK: {}", reason.into()));
        plan
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.reasoning.push(line.into());
    }

    /// Compact one-line description for logs.
    pub fn summary(&self) -> String {
        let actions: Vec<String> = self
            .actions
            .iter()
            .chain(&self.bonus_actions)
            .map(|a| match a.target {
                Some(target) => format!("{} -> {target}", a.kind),
                None => a.kind.to_string(),
            })
            .collect();
        let mut line = format!("{} plans {}", self.actor, self.strategy);
        if !actions.is_empty() {
            line.push_str(&format!(": {}", actions.join(", ")));
        }
        if self.fallback {
            line.push_str(" (fallback)");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_fire_builds_full_request() {
        let request = PlannedAction::fire(CombatantId(2), 1).request(CombatantId(1));
        assert_eq!(request.kind, ActionKind::FireWeapon);
        assert_eq!(request.target, Some(CombatantId(2)));
        assert_eq!(request.weapon, Some(1));
    }

    #[test]
    fn fallback_is_empty_defensive_stand() {
        let plan = DecisionPlan::fallback(CombatantId(3), 2, "deadline");
        assert_eq!(plan.strategy, Strategy::DefensiveStand);
        assert!(plan.fallback);
        assert!(plan.actions.is_empty() && plan.movement.is_none());
        assert!(plan.summary().ends_with("(fallback)"));
    }

    #[test]
    fn plan_round_trips_through_json() {
        let mut plan = DecisionPlan::new(CombatantId(1), 1, Strategy::Attack);
        plan.actions.push(PlannedAction::fire(CombatantId(2), 0));
        let json = serde_json::to_string(&plan).unwrap();
        let back: DecisionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
