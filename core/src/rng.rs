//! Deterministic random number generation.
//!
//! RULE: synthetic data never touches a platform RNG.
//! All randomness flows through SeededRng instances derived from a single
//! master seed, one stream per generator concern. This means:
//!   - Adding a new stream never changes existing streams.
//!   - The same seed always yields the same dataset.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for one generator stream.
pub struct SeededRng {
    inner: Pcg64Mcg,
}

impl SeededRng {
    /// Derive a stream from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn for_stream(master_seed: u64, stream: Stream) -> Self {
        Self::new(master_seed, stream as u64)
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample from a simplified Pareto distribution.
    /// x_min: minimum value, alpha: shape parameter (higher = less skewed).
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    /// Pick an index according to `weights` (need not sum to 1).
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut roll = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                return i;
            }
            roll -= w;
        }
        weights.len().saturating_sub(1)
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Customers = 0,
    Types = 1,
    Amounts = 2,
    Balances = 3,
    Fraud = 4,
}
