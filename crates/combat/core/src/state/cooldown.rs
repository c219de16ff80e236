//! Ability cooldowns and per-combat use limits.

use crate::action::ActionKind;
use crate::state::CombatantId;

/// Cooldown clause of an ability: rounds between uses and/or a use cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownRule {
    pub rounds: Option<u32>,
    pub uses_per_combat: Option<u32>,
}

impl CooldownRule {
    pub const fn rounds(rounds: u32) -> Self {
        Self {
            rounds: Some(rounds),
            uses_per_combat: None,
        }
    }

    pub const fn uses(uses: u32) -> Self {
        Self {
            rounds: None,
            uses_per_combat: Some(uses),
        }
    }

    pub const fn rounds_and_uses(rounds: u32, uses: u32) -> Self {
        Self {
            rounds: Some(rounds),
            uses_per_combat: Some(uses),
        }
    }
}

/// Usage record for one ability of one combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityCooldown {
    pub last_used_round: Option<u32>,
    pub uses_remaining: Option<u32>,
}

/// Why an ability cannot be used right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CooldownBlocked {
    #[error("on cooldown for {rounds_remaining} more round(s)")]
    OnCooldown { rounds_remaining: u32 },
    #[error("no uses remaining this combat")]
    Exhausted,
}

/// Cooldown view for consumers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownInfo {
    pub rounds_remaining: u32,
    pub uses_remaining: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownEntry {
    pub combatant: CombatantId,
    pub ability: ActionKind,
    pub state: AbilityCooldown,
}

/// Per-combatant, per-ability usage records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownTracker {
    entries: Vec<CooldownEntry>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, combatant: CombatantId, ability: ActionKind) -> Option<&AbilityCooldown> {
        self.entries
            .iter()
            .find(|e| e.combatant == combatant && e.ability == ability)
            .map(|e| &e.state)
    }

    /// Remaining rounds and uses for an ability under `rule` at `round`.
    pub fn info(
        &self,
        combatant: CombatantId,
        ability: ActionKind,
        rule: &CooldownRule,
        round: u32,
    ) -> CooldownInfo {
        let state = self.get(combatant, ability).copied().unwrap_or_default();
        let rounds_remaining = match (state.last_used_round, rule.rounds) {
            (Some(last), Some(rounds)) => (last + rounds).saturating_sub(round),
            _ => 0,
        };
        let uses_remaining = rule
            .uses_per_combat
            .map(|cap| state.uses_remaining.unwrap_or(cap));
        CooldownInfo {
            rounds_remaining,
            uses_remaining,
        }
    }

    pub fn check(
        &self,
        combatant: CombatantId,
        ability: ActionKind,
        rule: &CooldownRule,
        round: u32,
    ) -> Result<(), CooldownBlocked> {
        let info = self.info(combatant, ability, rule, round);
        if info.uses_remaining == Some(0) {
            return Err(CooldownBlocked::Exhausted);
        }
        if info.rounds_remaining > 0 {
            return Err(CooldownBlocked::OnCooldown {
                rounds_remaining: info.rounds_remaining,
            });
        }
        Ok(())
    }

    /// Records a use at `round`, consuming one use if the rule caps uses.
    pub fn mark_used(
        &mut self,
        combatant: CombatantId,
        ability: ActionKind,
        rule: &CooldownRule,
        round: u32,
    ) {
        let index = match self
            .entries
            .iter()
            .position(|e| e.combatant == combatant && e.ability == ability)
        {
            Some(index) => index,
            None => {
                self.entries.push(CooldownEntry {
                    combatant,
                    ability,
                    state: AbilityCooldown {
                        last_used_round: None,
                        uses_remaining: rule.uses_per_combat,
                    },
                });
                self.entries.len() - 1
            }
        };
        let state = &mut self.entries[index].state;
        state.last_used_round = Some(round);
        if let Some(uses) = state.uses_remaining.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }

    pub fn entries(&self) -> &[CooldownEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: CombatantId = CombatantId(1);

    #[test]
    fn rounds_cooldown_blocks_until_elapsed() {
        let mut tracker = CooldownTracker::new();
        let rule = CooldownRule::rounds(2);
        tracker.mark_used(ME, ActionKind::BoostShields, &rule, 3);

        assert_eq!(
            tracker.check(ME, ActionKind::BoostShields, &rule, 4),
            Err(CooldownBlocked::OnCooldown { rounds_remaining: 1 })
        );
        assert!(tracker.check(ME, ActionKind::BoostShields, &rule, 5).is_ok());
        assert!(tracker.check(CombatantId(2), ActionKind::BoostShields, &rule, 4).is_ok());
    }

    #[test]
    fn use_cap_exhausts() {
        let mut tracker = CooldownTracker::new();
        let rule = CooldownRule::uses(2);
        assert_eq!(
            tracker.info(ME, ActionKind::PointDefense, &rule, 1).uses_remaining,
            Some(2)
        );
        tracker.mark_used(ME, ActionKind::PointDefense, &rule, 1);
        tracker.mark_used(ME, ActionKind::PointDefense, &rule, 1);
        assert_eq!(
            tracker.check(ME, ActionKind::PointDefense, &rule, 9),
            Err(CooldownBlocked::Exhausted)
        );
    }
}
