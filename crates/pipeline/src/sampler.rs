//! Deterministic selection of the items a session is asked to rate.
//!
//! ## Algorithm
//! 1. Keep the first `pool_size` genre-filtered items (the best rated, since
//!    the catalog is sorted by rating)
//! 2. Shuffle them with a ChaCha8 stream seeded from `seed`
//! 3. Return the first `sample_size`
//!
//! ChaCha8 gives the same stream on every platform and rand release, so a
//! given catalog and seed always produce the same sample.

use data_loader::CatalogItem;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub const DEFAULT_POOL_SIZE: usize = 20;
pub const DEFAULT_SAMPLE_SIZE: usize = 5;
pub const DEFAULT_SAMPLE_SEED: u64 = 111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSampler {
    pool_size: usize,
    sample_size: usize,
    seed: u64,
}

impl Default for CandidateSampler {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl CandidateSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure how many top items are eligible (default: 20)
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Configure how many items are returned (default: 5)
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Configure the shuffle seed (default: 111)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Pick `min(sample_size, items.len())` items from the top of `items`.
    pub fn sample<'a>(&self, items: &[&'a CatalogItem]) -> Vec<&'a CatalogItem> {
        let pool_len = self.pool_size.min(items.len());
        let mut pool: Vec<&CatalogItem> = items[..pool_len].to_vec();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        pool.shuffle(&mut rng);
        pool.truncate(self.sample_size);

        debug!(
            "Sampled {} of {} pooled candidates (seed {})",
            pool.len(),
            pool_len,
            self.seed
        );
        pool
    }
}
