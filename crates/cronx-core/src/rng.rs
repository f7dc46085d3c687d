//! Deterministic pseudo-random source.
//!
//! Unseeded construction delegates to the platform generator; a seed
//! string drives a linear congruential generator so that two instances
//! built from the same seed draw identical sequences.

use std::cell::Cell;

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
const LCG_MODULUS: u64 = 1 << 31;

enum Source {
    Lcg(Cell<u64>),
    Platform,
}

/// A source of uniform draws in `[0, 1)`, optionally seeded for
/// reproducibility. Not `Sync` — construct one instance per strategy.
pub struct Rng {
    source: Source,
}

impl Rng {
    /// Builds an unseeded RNG backed by the platform's generator.
    #[must_use]
    pub fn unseeded() -> Self {
        Self {
            source: Source::Platform,
        }
    }

    /// Builds a deterministic RNG from a seed string. The seed is folded
    /// into a 32-bit non-zero state via `hash = (hash*31) + byte`; a
    /// result of zero is replaced with one.
    #[must_use]
    pub fn from_seed(seed: &str) -> Self {
        let mut hash: i64 = 0;
        for byte in seed.as_bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(i64::from(*byte));
        }
        let mut state = hash.unsigned_abs() % LCG_MODULUS;
        if state == 0 {
            state = 1;
        }
        Self {
            source: Source::Lcg(Cell::new(state)),
        }
    }

    /// Draws a uniform value in `[0, 1)`.
    pub fn next_f64(&self) -> f64 {
        match &self.source {
            Source::Lcg(state) => {
                let next = (LCG_MULTIPLIER.wrapping_mul(state.get()) + LCG_INCREMENT) % LCG_MODULUS;
                state.set(next);
                #[allow(clippy::cast_precision_loss)]
                let value = next as f64 / LCG_MODULUS as f64;
                value
            }
            Source::Platform => rand::random::<f64>(),
        }
    }

    /// Returns `lo + u * (hi - lo)`.
    pub fn uniform_random(&self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Box-Muller Gaussian draw, resampled while `|z| > 3`.
    pub fn gaussian_random(&self) -> f64 {
        const EPSILON: f64 = 1e-12;
        loop {
            let u1 = self.next_f64().max(EPSILON);
            let u2 = self.next_f64();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            if z.abs() <= 3.0 {
                return z;
            }
        }
    }

    /// Returns an index chosen with probability proportional to `weights`.
    /// Falls through to the last index if rounding leaves the running
    /// remainder positive after scanning every weight.
    #[must_use]
    pub fn weighted_random(&self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut r = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            r -= w;
            if r <= 0.0 {
                return i;
            }
        }
        weights.len().saturating_sub(1)
    }

    /// Returns `base * (1 + (2u - 1) * jitter)`.
    pub fn jittered_value(&self, base: f64, jitter: f64) -> f64 {
        base * (1.0 + (2.0 * self.next_f64() - 1.0) * jitter)
    }
}
