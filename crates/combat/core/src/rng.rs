//! Deterministic dice for attack, damage, and initiative rolls.
//!
//! All randomness in combat flows through [`RngOracle`] so that an encounter
//! replays identically from the same seeds. Ships own a [`DiceStream`] that
//! advances a nonce per roll; the AI derives one-off seeds with
//! [`compute_seed`] for tie-breaking and mistake checks.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d20 (1-20 inclusive).
    fn roll_d20(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 20) + 1
    }

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Roll a die with N sides (1-N inclusive).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        (self.next_u32(seed) % sides.max(1)) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Compute a deterministic seed from independent entropy sources.
///
/// # Arguments
///
/// * `base_seed` - Seed fixed at encounter start (per ship or per engine)
/// * `nonce` - Monotonic roll counter
/// * `stream` - Identifies the roller (combatant id, ship hash)
/// * `context` - Distinguishes several rolls made for the same event
///
/// # Context Values
///
/// - `0`: to-hit roll
/// - `1`: damage roll
/// - `2`: initiative roll
/// - `3`: AI decision noise
pub fn compute_seed(base_seed: u64, nonce: u64, stream: u32, context: u32) -> u64 {
    let mut hash = base_seed;

    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (stream as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche step
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Roll contexts used with [`compute_seed`].
pub mod roll_context {
    pub const TO_HIT: u32 = 0;
    pub const DAMAGE: u32 = 1;
    pub const INITIATIVE: u32 = 2;
    pub const AI_NOISE: u32 = 3;
}

/// Stateful dice stream: a base seed plus a nonce that advances on every roll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceStream {
    seed: u64,
    stream: u32,
    nonce: u64,
}

impl DiceStream {
    pub fn new(seed: u64, stream: u32) -> Self {
        Self {
            seed,
            stream,
            nonce: 0,
        }
    }

    fn next_seed(&mut self, context: u32) -> u64 {
        let seed = compute_seed(self.seed, self.nonce, self.stream, context);
        self.nonce += 1;
        seed
    }

    /// Rolls a d20 for the given roll context.
    pub fn d20(&mut self, context: u32) -> u32 {
        let seed = self.next_seed(context);
        PcgRng.roll_d20(seed)
    }

    /// Rolls a single die with `sides` faces.
    pub fn die(&mut self, context: u32, sides: u32) -> u32 {
        let seed = self.next_seed(context);
        PcgRng.roll_die(seed, sides)
    }

    /// Number of rolls consumed so far.
    pub fn rolls(&self) -> u64 {
        self.nonce
    }
}
