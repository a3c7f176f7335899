// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Curve Computation Context
//!
//! The engine owns exactly one [`CurveContext`] and shares it with every
//! component through an `Arc`. The context carries a 32-byte blinding seed
//! drawn from the OS RNG; every ECDSA signature is hedged with randomness
//! derived from that seed plus fresh OS entropy.
//!
//! ## Lifecycle
//!
//! 1. Created by [`CurveContext::new`] (unrandomized)
//! 2. Randomized exactly once, either eagerly by the engine or lazily by the
//!    first operation that needs it; concurrent callers race on a `OnceLock`
//!    so only one of them draws the seed
//! 3. Wiped when the last `Arc` is dropped

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroize;

use super::secret::SecretBytes;

/// Size of the blinding seed in bytes
pub const CONTEXT_SEED_SIZE: usize = 32;

pub struct CurveContext {
    seed: OnceLock<SecretBytes>,
    randomizations: AtomicUsize,
}

impl CurveContext {
    pub fn new() -> Self {
        Self {
            seed: OnceLock::new(),
            randomizations: AtomicUsize::new(0),
        }
    }

    /// Randomize the context if nobody has yet.
    ///
    /// Returns `true` only for the one call that performed the randomization.
    pub fn randomize(&self) -> bool {
        let mut performed = false;
        self.seed.get_or_init(|| {
            performed = true;
            self.randomizations.fetch_add(1, Ordering::SeqCst);

            let mut seed = [0u8; CONTEXT_SEED_SIZE];
            OsRng.fill_bytes(&mut seed);
            let secret = SecretBytes::from_slice(&seed);
            seed.zeroize();

            debug!("🎲 Curve context randomized");
            secret
        });
        performed
    }

    pub fn is_randomized(&self) -> bool {
        self.seed.get().is_some()
    }

    /// How many times the seed was drawn. Never more than one.
    pub fn randomization_count(&self) -> usize {
        self.randomizations.load(Ordering::SeqCst)
    }

    fn seed(&self) -> &SecretBytes {
        self.randomize();
        // randomize() guarantees the cell is populated
        self.seed.get_or_init(SecretBytes::default)
    }

    /// RNG used to hedge one ECDSA signature.
    ///
    /// Seeded from SHA-256(context seed || 32 fresh OS bytes), so two
    /// signatures never share hedging input.
    pub(crate) fn hedging_rng(&self) -> StdRng {
        let mut fresh = [0u8; 32];
        OsRng.fill_bytes(&mut fresh);

        let mut hasher = Sha256::new();
        hasher.update(self.seed().as_bytes());
        hasher.update(fresh);
        let mut rng_seed: [u8; 32] = hasher.finalize().into();

        let rng = StdRng::from_seed(rng_seed);
        rng_seed.zeroize();
        fresh.zeroize();
        rng
    }
}

impl Default for CurveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CurveContext {
    fn drop(&mut self) {
        if let Some(seed) = self.seed.get_mut() {
            seed.zeroize();
        }
        debug!("Curve context destroyed");
    }
}
