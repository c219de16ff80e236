//! Status effects attached to combatants.
//!
//! # Round-based Duration
//!
//! Effects store the number of rounds they have left. Every effect on every
//! combatant ticks once when a round ends; an effect reaching zero is
//! removed. `None` means the effect lasts until removed explicitly.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::CombatantId;

/// Types of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    /// Raises the owner's evasion by `magnitude`.
    Evasive,
    /// Temporary shield pool of `magnitude` points, drained before hull.
    ShieldBoost,
    /// `+magnitude` to the owner's attacks against `target`.
    TargetLocked,
    /// `-magnitude` to the owner's attacks.
    SensorJammed,
}

/// A single status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Rounds left; `None` is permanent until removed.
    pub remaining: Option<u32>,
    pub magnitude: i32,
    pub source: CombatantId,
    pub applied_round: u32,
    /// Combatant the effect is keyed to (target lock).
    pub target: Option<CombatantId>,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, magnitude: i32, remaining: Option<u32>) -> Self {
        Self {
            kind,
            remaining,
            magnitude,
            source: CombatantId::default(),
            applied_round: 0,
            target: None,
        }
    }

    pub fn from_source(mut self, source: CombatantId, round: u32) -> Self {
        self.source = source;
        self.applied_round = round;
        self
    }

    pub fn against(mut self, target: CombatantId) -> Self {
        self.target = Some(target);
        self
    }
}

/// Active status effects on a combatant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: ArrayVec<StatusEffect, { CombatConfig::MAX_STATUS_EFFECTS }>,
}

impl StatusEffects {
    pub fn empty() -> Self {
        Self {
            effects: ArrayVec::new(),
        }
    }

    /// Adds an effect. Returns false when the effect list is full.
    pub fn add(&mut self, effect: StatusEffect) -> bool {
        self.effects.try_push(effect).is_ok()
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Removes every effect of a kind, returning how many were removed.
    pub fn remove(&mut self, kind: StatusKind) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind != kind);
        before - self.effects.len()
    }

    /// Advances durations by one round and returns the effects that expired.
    pub fn tick(&mut self) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        for effect in self.effects.iter_mut() {
            if let Some(rounds) = effect.remaining.as_mut() {
                *rounds = rounds.saturating_sub(1);
            }
        }
        self.effects.retain(|e| {
            if e.remaining == Some(0) {
                expired.push(*e);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Sum of evasion bonuses.
    pub fn evasion_bonus(&self) -> i32 {
        self.sum_of(StatusKind::Evasive)
    }

    /// Net attack modifier of the owner when attacking `target`.
    pub fn attack_modifier_against(&self, target: CombatantId) -> i32 {
        let locked: i32 = self
            .effects
            .iter()
            .filter(|e| e.kind == StatusKind::TargetLocked && e.target == Some(target))
            .map(|e| e.magnitude)
            .sum();
        locked - self.sum_of(StatusKind::SensorJammed)
    }

    /// Sizes of the temporary shield pools, in application order.
    pub fn shield_pools(&self) -> Vec<u32> {
        self.effects
            .iter()
            .filter(|e| e.kind == StatusKind::ShieldBoost)
            .map(|e| e.magnitude.max(0) as u32)
            .collect()
    }

    pub fn shield_pool_total(&self) -> u32 {
        self.shield_pools().iter().sum()
    }

    /// Writes drained pool sizes back (same order as [`Self::shield_pools`])
    /// and removes pools that reached zero.
    pub fn set_shield_pools(&mut self, pools: &[u32]) {
        let mut sizes = pools.iter();
        for effect in self
            .effects
            .iter_mut()
            .filter(|e| e.kind == StatusKind::ShieldBoost)
        {
            if let Some(size) = sizes.next() {
                effect.magnitude = *size as i32;
            }
        }
        self.effects
            .retain(|e| !(e.kind == StatusKind::ShieldBoost && e.magnitude <= 0));
    }

    fn sum_of(&self, kind: StatusKind) -> i32 {
        self.effects
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.magnitude)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_expire_after_their_rounds() {
        let mut effects = StatusEffects::empty();
        effects.add(StatusEffect::new(StatusKind::Evasive, 3, Some(1)));
        effects.add(StatusEffect::new(StatusKind::SensorJammed, 2, Some(2)));
        effects.add(StatusEffect::new(StatusKind::Evasive, 1, None));
        assert_eq!(effects.evasion_bonus(), 4);

        let expired = effects.tick();
        assert_eq!(expired.len(), 1);
        assert_eq!(effects.evasion_bonus(), 1);

        effects.tick();
        assert!(!effects.has(StatusKind::SensorJammed));
        for _ in 0..10 {
            effects.tick();
        }
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn target_lock_applies_only_to_its_target() {
        let mut effects = StatusEffects::empty();
        effects.add(StatusEffect::new(StatusKind::TargetLocked, 2, Some(2)).against(CombatantId(5)));
        effects.add(StatusEffect::new(StatusKind::SensorJammed, 2, Some(2)));
        assert_eq!(effects.attack_modifier_against(CombatantId(5)), 0);
        assert_eq!(effects.attack_modifier_against(CombatantId(6)), -2);
    }

    #[test]
    fn drained_pools_are_removed() {
        let mut effects = StatusEffects::empty();
        effects.add(StatusEffect::new(StatusKind::ShieldBoost, 10, Some(1)));
        effects.add(StatusEffect::new(StatusKind::ShieldBoost, 6, Some(1)));
        assert_eq!(effects.shield_pools(), vec![10, 6]);
        effects.set_shield_pools(&[4, 0]);
        assert_eq!(effects.shield_pools(), vec![4]);
    }

    #[test]
    fn full_list_rejects_new_effects() {
        let mut effects = StatusEffects::empty();
        for _ in 0..CombatConfig::MAX_STATUS_EFFECTS {
            assert!(effects.add(StatusEffect::new(StatusKind::Evasive, 1, Some(1))));
        }
        assert!(!effects.add(StatusEffect::new(StatusKind::Evasive, 1, Some(1))));
    }
}
