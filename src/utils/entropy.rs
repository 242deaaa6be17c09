// src/utils/entropy.rs
//! Injectable randomness for identity synthesis.
//!
//! Party DIDs minted by the issuer are random stand-ins, not identity
//! bindings. Routing every random byte through [`EntropySource`] lets tests
//! pin the output with [`SeededEntropy`].

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::Mutex;

/// Source of random bytes.
pub trait EntropySource: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// Operating-system randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Reproducible randomness from a fixed seed.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) {
        // A panic while holding the lock leaves the generator usable.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.fill_bytes(dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_bytes() {
        let (a, b) = (SeededEntropy::new(7), SeededEntropy::new(7));
        let (mut x, mut y) = ([0u8; 20], [0u8; 20]);
        a.fill_bytes(&mut x);
        b.fill_bytes(&mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn test_successive_draws_differ() {
        let source = SeededEntropy::new(7);
        let (mut x, mut y) = ([0u8; 20], [0u8; 20]);
        source.fill_bytes(&mut x);
        source.fill_bytes(&mut y);
        assert_ne!(x, y);
    }
}
