//! Seeded linear-congruential random source.
//!
//! Reproducible clustering depends on every random decision being a pure
//! function of the seed. The generator is an explicit value threaded through
//! each call; nothing in the crate keeps ambient random state.

const MODULUS: u64 = 1 << 31;
const MULTIPLIER: u64 = 1_103_515_245;
const INCREMENT: u64 = 12_345;

/// Linear-congruential generator yielding values in `[0, 1)`.
///
/// Two instances built from the same seed produce identical sequences.
///
/// # Examples
/// ```
/// use cohort_core::DeterministicRandom;
///
/// let mut left = DeterministicRandom::new(42);
/// let mut right = DeterministicRandom::new(42);
/// let value = left.next_unit();
/// assert!((0.0..1.0).contains(&value));
/// assert_eq!(value, right.next_unit());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterministicRandom {
    state: u64,
}

impl DeterministicRandom {
    /// Creates a generator from `seed`, folding negative seeds into `[0, 2^31)`.
    #[must_use]
    pub fn new(seed: i64) -> Self {
        let modulus = MODULUS as i64;
        Self {
            state: seed.rem_euclid(modulus) as u64,
        }
    }

    /// Returns the current internal state.
    #[must_use]
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Advances the recurrence and returns a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Returns an index uniformly drawn from `0..len`.
    ///
    /// # Panics
    /// Panics when `len` is zero.
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot draw an index from an empty range");
        let scaled = (self.next_unit() * len as f64) as usize;
        scaled.min(len - 1)
    }

    /// Shuffles `items` in place with a Fisher–Yates pass driven by this source.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for upper in (1..items.len()).rev() {
            let pick = self.index(upper + 1);
            items.swap(upper, pick);
        }
    }
}
