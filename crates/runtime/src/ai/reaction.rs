//! Reaction decisions for open reaction windows.

use combat_core::{ActionKind, CombatStateMachine, CombatantId, TriggeringAction};

use crate::config::ProfileCatalog;

/// Chooses at most one reaction for `reactor` against `trigger`.
pub trait ReactionDecider: Send + Sync {
    fn decide(
        &self,
        machine: &CombatStateMachine,
        reactor: CombatantId,
        trigger: &TriggeringAction,
    ) -> Option<ActionKind>;
}

/// Never reacts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclineReactions;

impl ReactionDecider for DeclineReactions {
    fn decide(&self, _: &CombatStateMachine, _: CombatantId, _: &TriggeringAction) -> Option<ActionKind> {
        None
    }
}

/// Reaction policy for AI combatants.
///
/// Against a hit: point defense for guided munitions, evasive maneuvers when
/// the margin is small enough to turn the hit into a miss, emergency shields
/// when the volley would break through. Aggressive personalities answer with
/// counterfire when nothing defensive applies.
#[derive(Clone, Debug, Default)]
pub struct AiReactionPolicy {
    profiles: ProfileCatalog,
}

impl AiReactionPolicy {
    pub fn new(profiles: ProfileCatalog) -> Self {
        Self { profiles }
    }
}

impl ReactionDecider for AiReactionPolicy {
    fn decide(
        &self,
        machine: &CombatStateMachine,
        reactor: CombatantId,
        trigger: &TriggeringAction,
    ) -> Option<ActionKind> {
        let options = machine.reaction_options(reactor, trigger);
        if options.is_empty() {
            return None;
        }
        let me = machine.combatant(reactor)?;
        let offers = |kind: ActionKind| options.contains(&kind);

        if let Some(attack) = trigger.attack.as_ref().filter(|a| a.hit) {
            if trigger.guided && offers(ActionKind::PointDefense) {
                return Some(ActionKind::PointDefense);
            }
            let margin = attack.total - attack.target_tn;
            if !attack.crit
                && margin < machine.config().effects.evasive_reaction_bonus
                && offers(ActionKind::EvasiveManeuvers)
            {
                return Some(ActionKind::EvasiveManeuvers);
            }
            let volley = trigger
                .weapon
                .and_then(|i| machine.ship_stats(trigger.actor)?.weapons.get(i).cloned())
                .map_or(0.0, |w| w.average_volley());
            if volley > me.ship.current_shields() as f32 && offers(ActionKind::EmergencyShields) {
                return Some(ActionKind::EmergencyShields);
            }
        }

        let aggression = self
            .profiles
            .personality(me.personality.unwrap_or_default())
            .aggression;
        if aggression >= 0.7 && offers(ActionKind::Counterfire) {
            return Some(ActionKind::Counterfire);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::*;
    use combat_core::{AttackRoll, PersonalityKind};

    fn hit(total: i32, tn: i32) -> AttackRoll {
        AttackRoll {
            roll: 12,
            total,
            target_tn: tn,
            hit: total >= tn,
            crit: false,
            modifiers: Vec::new(),
        }
    }

    fn trigger(guided: bool, attack: AttackRoll) -> TriggeringAction {
        TriggeringAction {
            actor: CombatantId(1),
            kind: ActionKind::FireWeapon,
            target: Some(CombatantId(2)),
            weapon: Some(if guided { 1 } else { 0 }),
            guided,
            attack: Some(attack),
        }
    }

    #[test]
    fn guided_hit_draws_point_defense() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let choice = AiReactionPolicy::default().decide(&machine, CombatantId(2), &trigger(true, hit(15, 12)));
        assert_eq!(choice, Some(ActionKind::PointDefense));
    }

    #[test]
    fn narrow_hit_draws_evasion() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let choice = AiReactionPolicy::default().decide(&machine, CombatantId(2), &trigger(false, hit(13, 12)));
        assert_eq!(choice, Some(ActionKind::EvasiveManeuvers));
    }

    #[test]
    fn miss_is_ignored_unless_aggressive() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        let miss = trigger(false, hit(5, 12));
        assert_eq!(AiReactionPolicy::default().decide(&machine, CombatantId(2), &miss), None);

        let roster = vec![
            combatant(1, "Navy", 100),
            combatant(2, "Pirates", 100).with_personality(PersonalityKind::Berserker),
        ];
        let machine = begin(roster);
        assert_eq!(
            AiReactionPolicy::default().decide(&machine, CombatantId(2), &miss),
            Some(ActionKind::Counterfire)
        );
    }

    #[test]
    fn decline_never_reacts() {
        let machine = skirmish(&[("Navy", 100), ("Pirates", 100)]);
        assert_eq!(DeclineReactions.decide(&machine, CombatantId(2), &trigger(true, hit(15, 12))), None);
    }
}
