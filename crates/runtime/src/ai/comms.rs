//! Negotiation channel for surrender and truce offers (planning step 2).
//!
//! No dialogue system ships with the engine: [`StubNegotiator`] refuses every
//! offer, and [`ScriptedNegotiator`] accepts a fixed set of offer kinds for
//! tests and scripted scenarios. Hosts plug their own [`Negotiator`] in.

use std::collections::BTreeSet;

use combat_core::{CombatStateMachine, CombatantId};
use serde::{Deserialize, Serialize};

use super::risk::Strategy;

/// An offer made on behalf of `from`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationRequest {
    pub from: CombatantId,
    pub kind: Strategy,
    pub counterpart: Option<CombatantId>,
    pub round: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationReply {
    Accepted,
    Declined,
}

pub trait Negotiator: Send + Sync {
    fn negotiate(&self, machine: &CombatStateMachine, request: &NegotiationRequest) -> NegotiationReply;
}

/// Declines everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubNegotiator;

impl Negotiator for StubNegotiator {
    fn negotiate(&self, _machine: &CombatStateMachine, request: &NegotiationRequest) -> NegotiationReply {
        tracing::debug!(from = %request.from, kind = %request.kind, "negotiation stub declined");
        NegotiationReply::Declined
    }
}

/// Accepts offers whose kind is in the configured set.
#[derive(Clone, Debug, Default)]
pub struct ScriptedNegotiator {
    accepted: BTreeSet<Strategy>,
}

impl ScriptedNegotiator {
    pub fn accepting<I: IntoIterator<Item = Strategy>>(kinds: I) -> Self {
        Self {
            accepted: kinds.into_iter().collect(),
        }
    }
}

impl Negotiator for ScriptedNegotiator {
    fn negotiate(&self, machine: &CombatStateMachine, request: &NegotiationRequest) -> NegotiationReply {
        // A counterpart that already left the fight cannot answer.
        if let Some(other) = request.counterpart
            && !machine.is_active(other)
        {
            return NegotiationReply::Declined;
        }
        if self.accepted.contains(&request.kind) {
            NegotiationReply::Accepted
        } else {
            NegotiationReply::Declined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::skirmish;

    fn offer(kind: Strategy) -> NegotiationRequest {
        NegotiationRequest {
            from: CombatantId(1),
            kind,
            counterpart: Some(CombatantId(2)),
            round: 1,
        }
    }

    #[test]
    fn stub_declines() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        assert_eq!(
            StubNegotiator.negotiate(&machine, &offer(Strategy::Truce)),
            NegotiationReply::Declined
        );
    }

    #[test]
    fn scripted_accepts_listed_kinds() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let negotiator = ScriptedNegotiator::accepting([Strategy::Truce]);
        assert_eq!(
            negotiator.negotiate(&machine, &offer(Strategy::Truce)),
            NegotiationReply::Accepted
        );
        assert_eq!(
            negotiator.negotiate(&machine, &offer(Strategy::RequestSurrender)),
            NegotiationReply::Declined
        );
    }
}
