//! Deterministic, seeded RNG wrapper.
//!
//! Demand generation is the only randomized step in a study.  It draws from
//! one `SimRng` seeded from the config, so the same seed reproduces the
//! same OD list bit for bit and baseline and scenario runs share demand.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Study-level RNG.  Used only in single-threaded contexts.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn unit_f64(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// Draw an index from `dist`.
    #[inline]
    pub fn sample_index(&mut self, dist: &WeightedIndex<f64>) -> usize {
        dist.sample(&mut self.0)
    }
}
