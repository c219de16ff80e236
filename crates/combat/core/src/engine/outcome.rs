//! Surrender, withdrawal, truce, and end-of-combat detection.

use super::CombatStateMachine;
use crate::state::{CombatantId, CombatantStatus, Faction, StateError};

/// How the combat ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeReason {
    /// One faction has active combatants left.
    Victory,
    /// No faction has active combatants left.
    MutualDestruction,
    /// The last two factions agreed to disengage.
    Truce,
}

/// Final result, recorded once.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatOutcome {
    pub winner: Option<Faction>,
    pub reason: OutcomeReason,
    pub round: u32,
}

impl CombatStateMachine {
    /// Takes an active combatant out of the fight as surrendered.
    pub fn record_surrender(&mut self, id: CombatantId) -> Result<(), StateError> {
        self.retire(id, CombatantStatus::Surrendered)?;
        tracing::info!(combatant = %id, "combatant surrendered");
        let message = format!("{} surrenders", self.name_of(id));
        self.record(message);
        self.check_outcome();
        Ok(())
    }

    /// Takes an active combatant out of the fight as withdrawn.
    pub fn record_withdrawal(&mut self, id: CombatantId) -> Result<(), StateError> {
        self.retire(id, CombatantStatus::Withdrawn)?;
        tracing::info!(combatant = %id, "combatant withdrew");
        let message = format!("{} withdraws from the engagement", self.name_of(id));
        self.record(message);
        self.check_outcome();
        Ok(())
    }

    /// Every active combatant of both factions withdraws. If no other faction
    /// remains in the fight the combat ends without a winner.
    pub fn record_truce(&mut self, first: &Faction, second: &Faction) -> Result<(), StateError> {
        if !self.started {
            return Err(StateError::NotStarted);
        }
        if self.outcome.is_some() {
            return Err(StateError::CombatOver);
        }
        let leaving: Vec<CombatantId> = self
            .combatants
            .values()
            .filter(|c| c.is_active() && (&c.faction == first || &c.faction == second))
            .map(|c| c.id)
            .collect();
        for id in &leaving {
            self.retire(*id, CombatantStatus::Withdrawn)?;
        }
        tracing::info!(%first, %second, withdrawn = leaving.len(), "truce agreed");
        self.record(format!("{first} and {second} agree to a truce"));

        if self.active_factions().is_empty() {
            self.finish(None, OutcomeReason::Truce);
        } else {
            self.check_outcome();
        }
        Ok(())
    }

    /// Records an outcome once at most one faction has active combatants.
    /// Returns whether the combat is over.
    pub fn check_outcome(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        if !self.started {
            return false;
        }
        let mut remaining = self.active_factions().into_iter();
        match (remaining.next(), remaining.next()) {
            (Some(winner), None) => self.finish(Some(winner), OutcomeReason::Victory),
            (None, _) => self.finish(None, OutcomeReason::MutualDestruction),
            _ => return false,
        }
        true
    }

    fn retire(&mut self, id: CombatantId, status: CombatantStatus) -> Result<(), StateError> {
        if self.outcome.is_some() {
            return Err(StateError::CombatOver);
        }
        let combatant = self.combatant_mut(id)?;
        if combatant.is_active() {
            combatant.status = status;
        }
        Ok(())
    }

    fn finish(&mut self, winner: Option<Faction>, reason: OutcomeReason) {
        let message = match &winner {
            Some(faction) => format!("Combat over: {faction} wins ({reason})"),
            None => format!("Combat over: no winner ({reason})"),
        };
        tracing::info!(round = self.round, %reason, "combat over");
        self.outcome = Some(CombatOutcome {
            winner,
            reason,
            round: self.round,
        });
        self.record(message);
    }
}
