//! Random selection, kept apart from the deterministic quota logic

use rand::rngs::{SmallRng, ThreadRng};
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// Chooses which candidates a draw takes.
pub trait Sampler {
    /// Return `amount` distinct indices in `0..len`. Callers guarantee
    /// `amount <= len`.
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize>;
}

/// Uniform sampling without replacement.
pub struct RandomSampler<R: Rng> {
    rng: R,
}

impl RandomSampler<ThreadRng> {
    pub fn from_entropy() -> Self {
        Self { rng: rand::thread_rng() }
    }
}

impl RandomSampler<SmallRng> {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed) }
    }
}

impl<R: Rng> Sampler for RandomSampler<R> {
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }
}

/// Always takes the first candidates, for tests that need exact output.
#[derive(Debug, Default)]
pub struct FirstSampler;

impl Sampler for FirstSampler {
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize> {
        (0..amount.min(len)).collect()
    }
}
