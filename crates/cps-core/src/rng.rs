//! Deterministic RNG for the simulated collaborators.
//!
//! The core itself is deterministic; randomness only enters through the
//! simulated worker's reply latency and duplicate delivery.  Seeding from
//! the run's `SimConfig::seed` keeps those draws reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded `SmallRng` wrapper.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]; NaN counts as 0).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.0.gen_bool(p)
    }
}
