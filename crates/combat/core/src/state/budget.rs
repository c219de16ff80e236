//! Per-turn action economy.

use crate::config::BudgetGrant;

/// Resource consumed by an action.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ResourceKind {
    Action,
    BonusAction,
    Reaction,
    Movement,
}

/// One spend recorded against the budget this turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpentResource {
    pub kind: ResourceKind,
    pub name: String,
    pub cost: u32,
}

/// Counts granted at the start of a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BudgetCounts {
    pub actions: u32,
    pub bonus_actions: u32,
    pub reactions: u32,
    pub movement: u32,
}

impl BudgetCounts {
    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Action => self.actions,
            ResourceKind::BonusAction => self.bonus_actions,
            ResourceKind::Reaction => self.reactions,
            ResourceKind::Movement => self.movement,
        }
    }

    fn get_mut(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Action => &mut self.actions,
            ResourceKind::BonusAction => &mut self.bonus_actions,
            ResourceKind::Reaction => &mut self.reactions,
            ResourceKind::Movement => &mut self.movement,
        }
    }
}

/// Not enough of a resource left.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("needs {requested} {kind}, {remaining} remaining")]
pub struct InsufficientResource {
    pub kind: ResourceKind,
    pub requested: u32,
    pub remaining: u32,
}

/// Remaining action economy of one combatant plus what was spent this turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionBudget {
    granted: BudgetCounts,
    remaining: BudgetCounts,
    spent: Vec<SpentResource>,
}

impl ActionBudget {
    /// Fresh budget: the configured grant plus `movement` points.
    pub fn granted(grant: &BudgetGrant, movement: u32) -> Self {
        let counts = BudgetCounts {
            actions: grant.actions,
            bonus_actions: grant.bonus_actions,
            reactions: grant.reactions,
            movement,
        };
        Self {
            granted: counts,
            remaining: counts,
            spent: Vec::new(),
        }
    }

    pub fn reset(&mut self, grant: &BudgetGrant, movement: u32) {
        *self = Self::granted(grant, movement);
    }

    pub fn remaining(&self, kind: ResourceKind) -> u32 {
        self.remaining.get(kind)
    }

    pub fn remaining_counts(&self) -> BudgetCounts {
        self.remaining
    }

    pub fn granted_counts(&self) -> BudgetCounts {
        self.granted
    }

    pub fn can_spend(&self, kind: ResourceKind, cost: u32) -> bool {
        self.remaining(kind) >= cost
    }

    /// Deducts `cost` and records the spend. Nothing changes on failure.
    pub fn spend(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        cost: u32,
    ) -> Result<(), InsufficientResource> {
        let remaining = self.remaining.get_mut(kind);
        if *remaining < cost {
            return Err(InsufficientResource {
                kind,
                requested: cost,
                remaining: *remaining,
            });
        }
        *remaining -= cost;
        self.spent.push(SpentResource {
            kind,
            name: name.into(),
            cost,
        });
        Ok(())
    }

    /// Total spent of one resource this turn.
    pub fn spent_of(&self, kind: ResourceKind) -> u32 {
        self.spent
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.cost)
            .sum()
    }

    pub fn spent(&self) -> &[SpentResource] {
        &self.spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_the_only_action_exhausts_it() {
        let mut budget = ActionBudget::granted(&BudgetGrant::default(), 3);
        assert!(budget.can_spend(ResourceKind::Action, 1));
        budget.spend(ResourceKind::Action, "FireWeapon", 1).unwrap();
        assert!(!budget.can_spend(ResourceKind::Action, 1));
        assert_eq!(budget.spent().len(), 1);
    }

    #[test]
    fn spend_never_exceeds_grant() {
        let mut budget = ActionBudget::granted(&BudgetGrant::default(), 2);
        for _ in 0..5 {
            let _ = budget.spend(ResourceKind::Movement, "MoveCloser", 1);
            let _ = budget.spend(ResourceKind::Reaction, "Counterfire", 1);
        }
        assert_eq!(budget.spent_of(ResourceKind::Movement), 2);
        assert_eq!(budget.spent_of(ResourceKind::Reaction), 1);
        let err = budget.spend(ResourceKind::Movement, "MoveCloser", 1).unwrap_err();
        assert_eq!(err.remaining, 0);
    }

    #[test]
    fn reset_restores_grant() {
        let grant = BudgetGrant::default();
        let mut budget = ActionBudget::granted(&grant, 1);
        budget.spend(ResourceKind::BonusAction, "BoostShields", 1).unwrap();
        budget.reset(&grant, 4);
        assert_eq!(budget.remaining(ResourceKind::BonusAction), 1);
        assert_eq!(budget.remaining(ResourceKind::Movement), 4);
        assert!(budget.spent().is_empty());
    }
}
