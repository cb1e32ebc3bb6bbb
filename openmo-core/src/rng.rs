//! Deterministic per-trial RNG seeding.
//!
//! A master seed is expanded into one sub-seed per `(stream, trial)` pair via
//! BLAKE3. Derivation is hash-based rather than sequential, so a trial's
//! random stream does not depend on which thread runs it or in what order.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream label used by the bootstrap equity simulator.
pub const BOOTSTRAP_STREAM: &str = "bootstrap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSeeder {
    master_seed: u64,
}

impl TrialSeeder {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one trial of a named stream.
    pub fn seed_for(&self, stream: &str, trial: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&trial.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, stream: &str, trial: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed_for(stream, trial))
    }
}
