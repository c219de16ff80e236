//! Declarative action catalogue.

use std::collections::BTreeMap;

use super::effects;
use crate::action::{ActionKind, ActionOutcome, ActionRequest};
use crate::engine::CombatStateMachine;
use crate::ship::Capabilities;
use crate::state::{CooldownRule, ResourceKind};

/// Executes an action against the state machine after validation and spending.
pub type EffectFn = fn(&mut CombatStateMachine, &ActionRequest) -> ActionOutcome;

/// One catalogue entry.
#[derive(Clone, Copy)]
pub struct ActionDefinition {
    pub kind: ActionKind,
    pub name: &'static str,
    pub cost: ResourceKind,
    /// Lane steps granted per invocation (movement actions only).
    pub lane_steps: u32,
    pub requires_target: bool,
    /// Target must belong to another faction.
    pub hostile_target: bool,
    pub cooldown: Option<CooldownRule>,
    /// Reactions this action permits in response.
    pub allowed_reactions: &'static [ActionKind],
    pub requires: Capabilities,
    pub effect: EffectFn,
}

impl core::fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("kind", &self.kind)
            .field("cost", &self.cost)
            .field("requires_target", &self.requires_target)
            .field("cooldown", &self.cooldown)
            .field("allowed_reactions", &self.allowed_reactions)
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

impl ActionDefinition {
    const fn new(kind: ActionKind, name: &'static str, requires: Capabilities, effect: EffectFn) -> Self {
        Self {
            kind,
            name,
            cost: kind.cost_class(),
            lane_steps: 0,
            requires_target: false,
            hostile_target: false,
            cooldown: None,
            allowed_reactions: &[],
            requires,
            effect,
        }
    }

    const fn targeted(mut self, hostile: bool) -> Self {
        self.requires_target = true;
        self.hostile_target = hostile;
        self
    }

    const fn cooldown(mut self, rule: CooldownRule) -> Self {
        self.cooldown = Some(rule);
        self
    }

    const fn reactions(mut self, allowed: &'static [ActionKind]) -> Self {
        self.allowed_reactions = allowed;
        self
    }

    const fn steps(mut self, steps: u32) -> Self {
        self.lane_steps = steps;
        self
    }

    pub fn permits_reaction(&self, reaction: ActionKind) -> bool {
        self.allowed_reactions.contains(&reaction)
    }

    /// Resource units consumed, given the movement cost of one lane step.
    pub fn cost_amount(&self, lane_step_cost: u32) -> u32 {
        match self.cost {
            ResourceKind::Movement => self.lane_steps * lane_step_cost,
            _ => 1,
        }
    }
}

const FIRE_REACTIONS: &[ActionKind] = &[
    ActionKind::EvasiveManeuvers,
    ActionKind::PointDefense,
    ActionKind::EmergencyShields,
    ActionKind::Counterfire,
];

/// Fixed catalogue of actions and reactions.
#[derive(Clone, Debug)]
pub struct ActionRegistry {
    definitions: BTreeMap<ActionKind, ActionDefinition>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionRegistry {
    /// The built-in catalogue.
    pub fn standard() -> Self {
        use ActionKind as K;
        use Capabilities as C;

        let entries = [
            ActionDefinition::new(K::FireWeapon, "Fire Weapon", C::WEAPONS, effects::fire_weapon)
                .targeted(true)
                .reactions(FIRE_REACTIONS),
            ActionDefinition::new(K::Scan, "Scan", C::SENSORS, effects::scan).targeted(true),
            ActionDefinition::new(K::Evade, "Evade", C::PROPULSION, effects::evade),
            ActionDefinition::new(K::BoostShields, "Boost Shields", C::SHIELDS, effects::boost_shields)
                .cooldown(CooldownRule::rounds(2)),
            ActionDefinition::new(K::TargetLock, "Target Lock", C::SENSORS, effects::target_lock)
                .targeted(true)
                .cooldown(CooldownRule::rounds(1)),
            ActionDefinition::new(K::JamSensors, "Jam Sensors", C::SENSORS, effects::jam_sensors)
                .targeted(true)
                .cooldown(CooldownRule::rounds_and_uses(2, 2)),
            ActionDefinition::new(K::MoveCloser, "Move Closer", C::PROPULSION, effects::move_closer)
                .targeted(false)
                .steps(1),
            ActionDefinition::new(K::MoveFarther, "Move Farther", C::PROPULSION, effects::move_farther)
                .targeted(false)
                .steps(1),
            ActionDefinition::new(K::Hold, "Hold Position", C::empty(), effects::hold),
            ActionDefinition::new(
                K::EvasiveManeuvers,
                "Evasive Maneuvers",
                C::PROPULSION,
                effects::evasive_maneuvers,
            ),
            ActionDefinition::new(K::PointDefense, "Point Defense", C::POINT_DEFENSE, effects::point_defense)
                .cooldown(CooldownRule::uses(2)),
            ActionDefinition::new(
                K::EmergencyShields,
                "Emergency Shields",
                C::SHIELDS,
                effects::emergency_shields,
            )
            .cooldown(CooldownRule::rounds(3)),
            ActionDefinition::new(K::Counterfire, "Counterfire", C::WEAPONS, effects::counterfire)
                .targeted(true)
                .cooldown(CooldownRule::rounds(1)),
        ];

        Self {
            definitions: entries.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    pub fn get(&self, kind: ActionKind) -> Option<&ActionDefinition> {
        self.definitions.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.definitions.values()
    }

    /// Replaces or adds an entry.
    pub fn register(&mut self, definition: ActionDefinition) {
        self.definitions.insert(definition.kind, definition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_covers_every_action_kind() {
        use strum::IntoEnumIterator;
        let registry = ActionRegistry::standard();
        for kind in ActionKind::iter() {
            let def = registry.get(kind).unwrap();
            assert_eq!(def.cost, kind.cost_class());
        }
    }

    #[test]
    fn only_weapon_fire_opens_reactions() {
        let registry = ActionRegistry::standard();
        for def in registry.iter() {
            if def.kind == ActionKind::FireWeapon {
                assert_eq!(def.allowed_reactions.len(), 4);
            } else {
                assert!(def.allowed_reactions.is_empty());
            }
        }
    }

    #[test]
    fn movement_cost_scales_with_step_cost() {
        let registry = ActionRegistry::standard();
        assert_eq!(registry.get(ActionKind::MoveCloser).unwrap().cost_amount(2), 2);
        assert_eq!(registry.get(ActionKind::Hold).unwrap().cost_amount(2), 0);
        assert_eq!(registry.get(ActionKind::FireWeapon).unwrap().cost_amount(2), 1);
    }
}
