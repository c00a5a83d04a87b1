//! Random cohort sampling.
//!
//! Picks a uniformly random subset of a user population. The subset size is
//! `floor(N * percent / 100)`, so `0%` selects nobody and `100%` selects
//! everyone. Selection is a partial Fisher-Yates shuffle.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

use crate::domain::foundation::{Percentage, UserId};

/// Number of users selected from a population of `population` at `percent`.
pub fn sample_size(population: usize, percent: Percentage) -> usize {
    percent.of(population).min(population)
}

/// Draws random cohorts from a user population.
///
/// The generator is seeded once when the sampler is built and shared by all
/// draws, so rapid successive calls do not produce correlated subsets.
pub struct CohortSampler {
    rng: Mutex<StdRng>,
}

impl CohortSampler {
    /// Sampler seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sampler for reproducible draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Selects `sample_size(N, percent)` distinct users.
    ///
    /// Duplicate ids in `population` count once.
    pub fn sample(&self, mut population: Vec<UserId>, percent: Percentage) -> Vec<UserId> {
        population.sort_unstable();
        population.dedup();

        let amount = sample_size(population.len(), percent);
        if amount == 0 {
            return Vec::new();
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let (chosen, _) = population.partial_shuffle(&mut *rng, amount);
        chosen.to_vec()
    }
}

impl Default for CohortSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}
