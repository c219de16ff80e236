use combat_core::{ActionOutcome, AttackResolution, CombatantId, ReactionResolution};
use serde::{Deserialize, Serialize};

use crate::ai::DecisionPlan;

/// What happened during one combatant's turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub actor: CombatantId,
    pub round: u32,
    pub plan: DecisionPlan,
    /// Outcomes of the plan's own actions, in execution order.
    pub outcomes: Vec<ActionOutcome>,
    pub attacks: Vec<AttackResolution>,
    pub reactions: Vec<ReactionResolution>,
    /// A negotiated agreement was applied at the start of the turn.
    pub agreement_applied: bool,
    pub withdrew: bool,
    /// Combatant holding the initiative once this turn ended.
    pub next: Option<CombatantId>,
    pub combat_over: bool,
}

impl TurnReport {
    pub(crate) fn new(plan: DecisionPlan) -> Self {
        Self {
            actor: plan.actor,
            round: plan.round,
            plan,
            outcomes: Vec::new(),
            attacks: Vec::new(),
            reactions: Vec::new(),
            agreement_applied: false,
            withdrew: false,
            next: None,
            combat_over: false,
        }
    }

    pub fn hits(&self) -> usize {
        self.attacks.iter().filter(|a| a.hit()).count()
    }

    pub fn damage_dealt(&self) -> u32 {
        self.attacks
            .iter()
            .filter_map(|a| a.damage.as_ref())
            .map(|d| d.absorption.incoming - d.absorption.overflow)
            .sum()
    }
}
