// Deterministic, portable pseudo-random number generation for Boomtown.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding,
// plus the `RandomSource` trait that the simulation draws every roll through.
// The engine is generic over `RandomSource`, so the driver can hand it a
// seeded `GameRng` while tests hand it a `ScriptedRng` that replays a fixed
// list of values.
//
// All derived helpers (ranges, percentage rolls, shuffles) are expressed in
// terms of a uniform `[0, 1)` draw. That mirrors how the game rules are
// written ("floor(rand * 3) + 1 customers") and keeps scripted tests readable:
// a scripted `0.5` means "the middle of whatever range is being rolled".
//
// **Critical constraint: determinism.** Every method on `GameRng` must produce
// identical output given the same prior state, regardless of platform,
// compiler version, or optimization level. No stdlib PRNG, no OS entropy.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RandomSource: the injectable interface
// ---------------------------------------------------------------------------

/// A source of uniform randomness for the simulation.
///
/// Implementors only need `next_f64`. Every helper degrades instead of
/// panicking on empty or inverted ranges, because the engine is not allowed
/// to abort a tick over bad reference data.
pub trait RandomSource {
    /// A uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// A uniform integer in `[0, n)`. Returns 0 when `n == 0`.
    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as u64).min(n - 1)
    }

    /// A uniform integer in `[low, high)`. Returns `low` when the range is
    /// empty or inverted.
    fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        low + self.below(high - low)
    }

    /// Return `true` with probability `percent / 100`.
    fn roll_percent(&mut self, percent: f64) -> bool {
        self.next_f64() * 100.0 < percent
    }

    /// Pick a uniform index into a collection of `len` elements.
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.below(len as u64) as usize)
        }
    }

    /// Fisher–Yates shuffle in place.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }

    fn below(&mut self, n: u64) -> u64 {
        (**self).below(n)
    }
}

// ---------------------------------------------------------------------------
// GameRng: xoshiro256++
// ---------------------------------------------------------------------------

/// Xoshiro256++ PRNG: the production randomness source.
///
/// The driver owns one `GameRng` per world and stores it inside the world
/// snapshot (`WorldState::rng_state`), so a restarted process continues the
/// same stream instead of replaying it from the seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `GameRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

impl RandomSource for GameRng {
    /// Uses the upper 53 bits of a `u64` to fill the mantissa of an f64.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Rejection sampling to avoid modulo bias.
    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        if n.is_power_of_two() {
            return self.next_u64() & (n - 1);
        }
        let threshold = n.wrapping_neg() % n; // = (2^64 - n) % n
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % n;
            }
        }
    }
}

/// SplitMix64: used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// ScriptedRng: replayable values for tests and tooling
// ---------------------------------------------------------------------------

/// Replays a fixed list of `[0, 1)` values, cycling when exhausted.
///
/// Values at or above 1.0 are clamped just below 1.0, negative values to 0.0.
/// An empty script always yields 0.0.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source that returns the same value forever.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        if v.is_nan() || v < 0.0 {
            0.0
        } else if v >= 1.0 {
            1.0 - f64::EPSILON
        } else {
            v
        }
    }
}
