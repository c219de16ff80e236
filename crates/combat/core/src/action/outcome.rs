//! Results returned by action effects and damage application.

use crate::action::{ActionKind, ActionRejection};
use crate::combat::Absorption;
use crate::positioning::{DistanceBand, MoveOutcome};
use crate::ship::{AttackRoll, Weapon};
use crate::state::{CombatantId, TriggeringAction};

/// A resolved to-hit roll whose damage has not been applied yet.
///
/// Produced by `FireWeapon`; consumed by
/// [`CombatStateMachine::apply_pending_attack`](crate::engine::CombatStateMachine::apply_pending_attack)
/// after the reaction window closes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingAttack {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub weapon_index: usize,
    pub weapon: Weapon,
    pub band: DistanceBand,
    pub attack: AttackRoll,
}

impl PendingAttack {
    /// Trigger record for the reaction window this attack opens.
    pub fn trigger(&self) -> TriggeringAction {
        TriggeringAction {
            actor: self.attacker,
            kind: ActionKind::FireWeapon,
            target: Some(self.target),
            weapon: Some(self.weapon_index),
            guided: self.weapon.guided,
            attack: Some(self.attack.clone()),
        }
    }
}

/// Damage written to a combatant, with the absorption breakdown.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    pub target: CombatantId,
    pub source: Option<CombatantId>,
    pub absorption: Absorption,
    pub disabled: bool,
}

/// Final result of a pending attack.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResolution {
    pub attacker: CombatantId,
    pub target: CombatantId,
    /// Attack after revalidation against the post-reaction target number.
    pub attack: AttackRoll,
    pub intercepted: bool,
    pub damage: Option<DamageReport>,
}

impl AttackResolution {
    pub fn hit(&self) -> bool {
        self.attack.hit && !self.intercepted
    }
}

/// `{success, message, ...}` result of an action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOutcome {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub success: bool,
    pub message: String,
    pub rejection: Option<ActionRejection>,
    pub target: Option<CombatantId>,
    pub pending_attack: Option<PendingAttack>,
    pub movement: Option<MoveOutcome>,
    pub damage: Option<DamageReport>,
    pub shields_restored: Option<u32>,
    /// A defensive reaction fully negated the incoming attack.
    pub intercepted: bool,
}

impl ActionOutcome {
    pub fn success(actor: CombatantId, kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            actor,
            kind,
            success: true,
            message: message.into(),
            rejection: None,
            target: None,
            pending_attack: None,
            movement: None,
            damage: None,
            shields_restored: None,
            intercepted: false,
        }
    }

    pub fn failure(actor: CombatantId, kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(actor, kind, message)
        }
    }

    pub fn rejected(actor: CombatantId, kind: ActionKind, rejection: ActionRejection) -> Self {
        Self {
            rejection: Some(rejection.clone()),
            ..Self::failure(actor, kind, rejection.to_string())
        }
    }

    pub fn with_target(mut self, target: CombatantId) -> Self {
        self.target = Some(target);
        self
    }

    /// True if the outcome carries an attack awaiting damage application.
    pub fn awaits_damage(&self) -> bool {
        self.pending_attack.is_some()
    }
}
