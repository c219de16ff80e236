//! Hit revalidation and hit probability.

use crate::ship::AttackRoll;

/// Re-checks a resolved attack against a (possibly raised) target number.
///
/// The result can only move from hit toward miss: a roll that missed stays a
/// miss even if the new target number is lower.
///
/// # Formula
///
/// ```text
/// hit' = hit && total >= new_tn
/// crit' = crit && hit'
/// ```
pub fn revalidate(attack: &AttackRoll, new_tn: i32) -> AttackRoll {
    let hit = attack.hit && attack.total >= new_tn;
    AttackRoll {
        target_tn: new_tn.max(attack.target_tn),
        hit,
        crit: attack.crit && hit,
        ..attack.clone()
    }
}

/// Probability that `d20 + bonus >= target_tn`, clamped to `[0.05, 0.95]`.
pub fn hit_probability(bonus: i32, target_tn: i32) -> f32 {
    let needed = target_tn - bonus;
    let faces = (21 - needed).clamp(0, 20) as f32;
    (faces / 20.0).clamp(0.05, 0.95)
}
