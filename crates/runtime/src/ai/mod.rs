//! Tactical AI for computer-controlled combatants.
//!
//! Planning one turn runs five steps against a read-only [`AiContext`]:
//!
//! 1. **Risk**: pick a strategy (attack, defensive stand, flee, surrender,
//!    request surrender, truce) from hull, force ratio, and performance
//! 2. **Comms**: negotiated strategies go through a [`Negotiator`]; a refusal
//!    re-enters step 1 up to a recursion cap
//! 3. **Action**: project every weapon/target pair a few turns ahead and pick
//!    the best, substituting an in-band weapon when needed
//! 4. **Movement**: score closer/farther/hold for the chosen engagement
//! 5. **Reassess**: project next-turn posture and pick bonus actions and the
//!    final movement
//!
//! The output is a [`DecisionPlan`]. Planning has a hard deadline; any
//! failure yields [`DecisionPlan::fallback`] instead of an error.
//!
//! # Core Components
//!
//! - [`AiDecisionEngine`]: runs the five steps under the planning budget
//! - [`AiReactionPolicy`]: answers reaction windows for AI combatants
//! - [`threat`], [`targeting`], [`projection`]: scoring helpers

pub mod comms;
pub mod context;
pub mod engine;
pub mod movement;
pub mod plan;
pub mod posture;
pub mod projection;
pub mod reaction;
pub mod risk;
pub mod targeting;
pub mod threat;

pub use comms::{NegotiationReply, NegotiationRequest, Negotiator, ScriptedNegotiator, StubNegotiator};
pub use context::{AiContext, EnemyEstimate};
pub use engine::{AiDecisionEngine, PlanningError};
pub use plan::{Agreement, DecisionPlan, PlannedAction};
pub use posture::Posture;
pub use reaction::{AiReactionPolicy, DeclineReactions, ReactionDecider};
pub use risk::{RiskAssessment, Strategy};

#[cfg(test)]
pub(crate) mod testing {
    //! Roster builders shared by the AI and flow tests.

    use combat_core::{
        CombatConfig, CombatStateMachine, Combatant, CombatantId, ComponentKind, Controller,
        DamageDice, DistanceBand, HullClass, ShipSpec, ShipSystems, StandardShip, Weapon,
    };

    pub fn spec(name: &str) -> ShipSpec {
        ShipSpec {
            name: name.to_string(),
            hull_class: HullClass::Frigate,
            max_hull: 100,
            max_shields: 40,
            speed: 2,
            evasion: 0,
            attack_bonus: 2,
            signature_radius: 8,
            initiative: 0,
            sensor_range: 500,
            armor: 0,
            weapons: vec![
                Weapon::centered_on("railgun", DamageDice::new(2, 6, 0), DistanceBand::Long)
                    .with_attack_bonus(1),
                Weapon::centered_on("torpedo", DamageDice::new(3, 8, 0), DistanceBand::Medium)
                    .guided(),
            ],
            components: vec![
                ComponentKind::Weapon,
                ComponentKind::Engine,
                ComponentKind::Sensor,
                ComponentKind::ShieldGenerator,
                ComponentKind::PointDefense,
            ],
        }
    }

    /// Combatant `id` with the given current hull; lower ids act first.
    pub fn combatant(id: u32, faction: &str, hull: u32) -> Combatant {
        let name = format!("{faction}-{id}");
        let mut ship =
            StandardShip::from_spec(spec(&name), 11).with_fixed_initiative(100 - id as i32);
        ship.set_current_hull(hull);
        Combatant::new(CombatantId(id), name, faction, Controller::Ai, Box::new(ship))
    }

    /// Full-hull combatant whose to-hit and damage rolls are queued up front.
    pub fn scripted(id: u32, faction: &str, d20: &[u32], damage: &[u32]) -> Combatant {
        let name = format!("{faction}-{id}");
        let mut ship =
            StandardShip::from_spec(spec(&name), 11).with_fixed_initiative(100 - id as i32);
        ship.queue_d20(d20.iter().copied());
        ship.queue_damage(damage.iter().copied());
        Combatant::new(CombatantId(id), name, faction, Controller::Ai, Box::new(ship))
    }

    /// Ships numbered from 1 in slice order, each `(faction, hull)`.
    pub fn skirmish(entries: &[(&str, u32)]) -> CombatStateMachine {
        let roster = entries
            .iter()
            .enumerate()
            .map(|(i, (faction, hull))| combatant(i as u32 + 1, faction, *hull));
        CombatStateMachine::begin(CombatConfig::default(), roster).unwrap()
    }

    pub fn begin(roster: Vec<Combatant>) -> CombatStateMachine {
        CombatStateMachine::begin(CombatConfig::default(), roster).unwrap()
    }
}
