//! Damage absorption order: shields, temporary pools, hull.

/// Breakdown of a damage application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Absorption {
    pub incoming: u32,
    pub shield_absorbed: u32,
    /// Amount taken by each temporary pool, in the order the pools were given.
    pub pool_absorbed: Vec<u32>,
    pub hull_damage: u32,
    pub shields_after: u32,
    pub hull_after: u32,
    /// Damage beyond what the hull could take.
    pub overflow: u32,
}

impl Absorption {
    pub fn pool_total(&self) -> u32 {
        self.pool_absorbed.iter().sum()
    }
}

/// Applies `amount` to shields, then temporary pools, then hull.
///
/// Pools are drained in place. Damage reaching the pools is split in
/// proportion to each pool's size (floored); leftover units go one at a time
/// to pools with remaining capacity, in order. Hull and shields never go
/// below zero.
pub fn absorb_damage(amount: u32, shields: u32, pools: &mut [u32], hull: u32) -> Absorption {
    let shield_absorbed = amount.min(shields);
    let mut remaining = amount - shield_absorbed;

    let pool_sum: u64 = pools.iter().map(|&p| u64::from(p)).sum();
    let to_pools = u64::from(remaining).min(pool_sum) as u32;
    let mut pool_absorbed = vec![0u32; pools.len()];

    if to_pools > 0 {
        for (taken, &pool) in pool_absorbed.iter_mut().zip(pools.iter()) {
            *taken = (u64::from(to_pools) * u64::from(pool) / pool_sum) as u32;
        }
        let mut leftover = to_pools - pool_absorbed.iter().sum::<u32>();
        while leftover > 0 {
            let mut progressed = false;
            for (taken, &pool) in pool_absorbed.iter_mut().zip(pools.iter()) {
                if leftover == 0 {
                    break;
                }
                if *taken < pool {
                    *taken += 1;
                    leftover -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        for (pool, taken) in pools.iter_mut().zip(pool_absorbed.iter()) {
            *pool -= *taken;
        }
        remaining -= pool_absorbed.iter().sum::<u32>();
    }

    let hull_damage = remaining.min(hull);
    Absorption {
        incoming: amount,
        shield_absorbed,
        pool_absorbed,
        hull_damage,
        shields_after: shields - shield_absorbed,
        hull_after: hull - hull_damage,
        overflow: remaining - hull_damage,
    }
}
