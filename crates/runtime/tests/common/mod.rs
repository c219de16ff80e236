//! Roster builders shared by the runtime integration tests.

#![allow(dead_code)]

use combat_core::{
    CombatConfig, CombatStateMachine, Combatant, CombatantId, Controller, HullClass, ShipSpec,
    StandardShip,
};

/// Frigate `id`; lower ids act first. Queued d20 results are consumed before
/// the seeded dice.
pub fn frigate(id: u32, faction: &str, controller: Controller, d20: &[u32]) -> Combatant {
    let name = format!("{faction}-{id}");
    let spec = ShipSpec::nominal(name.clone(), HullClass::Frigate);
    let mut ship = StandardShip::from_spec(spec, 40 + id as u64).with_fixed_initiative(100 - id as i32);
    ship.queue_d20(d20.iter().copied());
    Combatant::new(CombatantId(id), name, faction, controller, Box::new(ship))
}

pub fn duel() -> CombatStateMachine {
    begin(vec![
        frigate(1, "Navy", Controller::Ai, &[]),
        frigate(2, "Pirates", Controller::Ai, &[]),
    ])
}

pub fn begin(roster: Vec<Combatant>) -> CombatStateMachine {
    CombatStateMachine::begin(CombatConfig::default(), roster).expect("roster starts")
}
