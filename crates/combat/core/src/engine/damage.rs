//! Attack rolls, damage application, and shield restoration.

use super::CombatStateMachine;
use crate::action::{ActionRejection, AttackResolution, DamageReport, PendingAttack};
use crate::combat::{absorb_damage, revalidate};
use crate::positioning::{MoveOutcome, StepDirection};
use crate::ship::AttackContext;
use crate::state::{CombatantId, CombatantStatus, StateError, StatusEffect, StatusKind};

impl CombatStateMachine {
    /// Situational to-hit inputs for `attacker` firing at `defender`.
    pub fn attack_context(&self, attacker: CombatantId, defender: CombatantId) -> AttackContext {
        let defender_evasion = self
            .ship_stats(defender)
            .map(|s| s.evasion)
            .unwrap_or(0)
            + self
                .effects
                .get(&defender)
                .map(|e| e.evasion_bonus())
                .unwrap_or(0);
        let attack_modifier = self
            .effects
            .get(&attacker)
            .map(|e| e.attack_modifier_against(defender))
            .unwrap_or(0);
        AttackContext {
            base_tn: self.config.base_tn,
            sr_base: self.config.sr_base,
            defender_evasion,
            attack_modifier,
        }
    }

    /// Current target number of `defender` against `attacker`.
    pub fn target_number(&self, attacker: CombatantId, defender: CombatantId) -> i32 {
        let sr = self
            .ship_stats(defender)
            .map(|s| s.signature_radius)
            .unwrap_or(self.config.sr_base);
        self.attack_context(attacker, defender).target_number(sr)
    }

    /// Resolves a to-hit roll without applying damage.
    pub fn roll_attack(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        weapon: Option<usize>,
    ) -> Result<PendingAttack, ActionRejection> {
        let (weapon_index, weapon) = self.select_weapon(attacker, target, weapon)?;
        let band = self.positions.band(attacker, target);
        let ctx = self.attack_context(attacker, target);
        let defender_sr = self
            .ship_stats(target)
            .map(|s| s.signature_radius)
            .ok_or(ActionRejection::UnknownCombatant { id: target })?;

        let combatant = self
            .combatants
            .get_mut(&attacker)
            .ok_or(ActionRejection::UnknownCombatant { id: attacker })?;
        let attack = combatant
            .ship
            .roll_attack(defender_sr, &weapon, band, &ctx)
            .map_err(|err| ActionRejection::WeaponOutOfBand {
                weapon: err.weapon,
                band: err.band,
            })?;
        combatant.performance.attacks_made += 1;

        Ok(PendingAttack {
            attacker,
            target,
            weapon_index,
            weapon,
            band,
            attack,
        })
    }

    /// Finalizes an attack after its reaction window has resolved.
    ///
    /// The hit is revalidated against the defender's current target number
    /// (a reaction may have granted evasion), which can only turn a hit into a
    /// miss. Intercepted attacks deal no damage.
    pub fn apply_pending_attack(
        &mut self,
        pending: PendingAttack,
        intercepted: bool,
    ) -> Result<AttackResolution, StateError> {
        if self.window.is_some() {
            return Err(StateError::ReactionWindowOpen);
        }
        let PendingAttack {
            attacker,
            target,
            weapon,
            attack,
            ..
        } = pending;
        if !self.combatants.contains_key(&attacker) {
            return Err(StateError::UnknownCombatant { id: attacker });
        }
        if !self.combatants.contains_key(&target) {
            return Err(StateError::UnknownCombatant { id: target });
        }

        let new_tn = self.target_number(attacker, target);
        let was_hit = attack.hit;
        let attack = revalidate(&attack, new_tn);
        let flipped = was_hit && !attack.hit;

        let landed = attack.hit && !intercepted && self.is_active(target);
        let damage = if landed {
            let roll = self.combatant_mut(attacker)?.ship.roll_damage(&weapon, attack.crit);
            Some(self.apply_damage(target, roll.damage, Some(attacker))?)
        } else {
            None
        };

        let performance = &mut self.combatant_mut(attacker)?.performance;
        match &damage {
            Some(report) => {
                performance.attacks_hit += 1;
                performance.damage_dealt += report.absorption.incoming - report.absorption.overflow;
            }
            None => performance.attacks_missed += 1,
        }

        let message = if intercepted {
            format!("{}'s {} is intercepted", self.name_of(attacker), weapon.name)
        } else if !landed && flipped {
            format!(
                "{} evades {}'s {} (TN now {new_tn})",
                self.name_of(target),
                self.name_of(attacker),
                weapon.name
            )
        } else if !landed {
            format!("{}'s {} misses {}", self.name_of(attacker), weapon.name, self.name_of(target))
        } else {
            format!("{}'s {} hits {}", self.name_of(attacker), weapon.name, self.name_of(target))
        };
        self.record(message);

        Ok(AttackResolution {
            attacker,
            target,
            attack,
            intercepted,
            damage,
        })
    }

    /// Applies damage: shields, then temporary shield pools (proportionally),
    /// then hull, floored at zero. A hull at zero disables the combatant.
    pub fn apply_damage(
        &mut self,
        target: CombatantId,
        amount: u32,
        source: Option<CombatantId>,
    ) -> Result<DamageReport, StateError> {
        let mut pools = self
            .effects
            .get(&target)
            .map(|e| e.shield_pools())
            .unwrap_or_default();

        let combatant = self.combatant_mut(target)?;
        let shields = combatant.ship.current_shields();
        let hull = combatant.ship.current_hull();
        let absorption = absorb_damage(amount, shields, &mut pools, hull);
        combatant.ship.set_current_shields(absorption.shields_after);
        combatant.ship.set_current_hull(absorption.hull_after);
        combatant.performance.damage_taken += amount - absorption.overflow;

        let newly_disabled = absorption.hull_after == 0 && combatant.status.is_active();
        if newly_disabled {
            combatant.status = CombatantStatus::Disabled;
        }

        if let Some(effects) = self.effects.get_mut(&target) {
            effects.set_shield_pools(&pools);
        }

        let name = self.name_of(target);
        let mut message = format!(
            "{name} takes {amount} damage: shields {shields} -> {}",
            absorption.shields_after
        );
        if absorption.pool_total() > 0 {
            message.push_str(&format!(", temporary shields -{}", absorption.pool_total()));
        }
        message.push_str(&format!(", hull {hull} -> {}", absorption.hull_after));
        tracing::info!(target = %target, amount, hull = absorption.hull_after, "damage applied");
        self.record(message);

        if newly_disabled {
            tracing::info!(combatant = %target, "combatant disabled");
            self.record(format!("{name} is disabled"));
            self.check_outcome();
        }

        Ok(DamageReport {
            target,
            source,
            absorption,
            disabled: newly_disabled,
        })
    }

    /// Restores up to `amount` shield points, capped at max. Returns the
    /// amount actually restored.
    pub fn restore_shields(&mut self, id: CombatantId, amount: u32) -> Result<u32, StateError> {
        let combatant = self.combatant_mut(id)?;
        let max = combatant.ship.combat_stats().max_shields;
        let before = combatant.ship.current_shields();
        let after = before.saturating_add(amount).min(max);
        combatant.ship.set_current_shields(after);
        Ok(after - before)
    }

    /// Restores hull, capped at max. Disabled combatants stay disabled.
    pub fn repair_hull(&mut self, id: CombatantId, amount: u32) -> Result<u32, StateError> {
        let combatant = self.combatant_mut(id)?;
        let max = combatant.ship.combat_stats().max_hull;
        let before = combatant.ship.current_hull();
        let after = before.saturating_add(amount).min(max);
        combatant.ship.set_current_hull(after);
        let restored = after - before;
        if restored > 0 {
            let message = format!("{} repairs {restored} hull", self.name_of(id));
            self.record(message);
        }
        Ok(restored)
    }

    /// Adds a status effect to `owner` and logs it. False if the list is full.
    pub fn add_status_effect(&mut self, owner: CombatantId, effect: StatusEffect) -> bool {
        let added = self
            .effects
            .entry(owner)
            .or_default()
            .add(effect);
        if added {
            let duration = match effect.remaining {
                Some(rounds) => format!("{rounds} round(s)"),
                None => "until removed".to_string(),
            };
            let message = format!(
                "{} gains {} ({}) for {duration}",
                self.name_of(owner),
                effect.kind,
                effect.magnitude
            );
            self.record(message);
        }
        added
    }

    /// Removes every effect of a kind from `owner`.
    pub fn remove_status_effect(&mut self, owner: CombatantId, kind: StatusKind) -> usize {
        let removed = self.effects.get_mut(&owner).map(|e| e.remove(kind)).unwrap_or(0);
        if removed > 0 {
            let message = format!("{}'s {kind} effect is removed", self.name_of(owner));
            self.record(message);
        }
        removed
    }

    /// Single-lane step of `mover` relative to `target`.
    pub fn move_combatant(
        &mut self,
        mover: CombatantId,
        target: CombatantId,
        direction: StepDirection,
    ) -> MoveOutcome {
        match direction {
            StepDirection::Closer => self.positions.move_closer(mover, target),
            StepDirection::Farther => self.positions.move_farther(mover, target),
        }
    }

    /// Marks `target` as scanned by `scanner`.
    pub fn record_scan(&mut self, scanner: CombatantId, target: CombatantId) {
        if let Some(combatant) = self.combatants.get_mut(&scanner) {
            combatant.scanned.insert(target);
        }
    }
}
