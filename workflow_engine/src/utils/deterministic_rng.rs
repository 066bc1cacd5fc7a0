//! Seeded RNG for reproducible test fixtures (ids, sampled delays) where
//! a real `rand::rng()` would make assertions flaky.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { inner: StdRng::seed_from_u64(seed) }
    }

    pub fn random_u64(&mut self) -> u64 {
        self.inner.random()
    }

    pub fn random_string(&mut self, len: usize) -> String {
        const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        (0..len)
            .map(|_| CHARSET[self.inner.random_range(0..CHARSET.len())] as char)
            .collect()
    }
}
