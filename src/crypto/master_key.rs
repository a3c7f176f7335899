// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Master Passphrase Sources
//!
//! Every private-key operation takes an explicit `ephemeral` flag:
//!
//! - `ephemeral = true`: the fixed [`EPHEMERAL_PASSPHRASE`] is used. Meant for
//!   throwaway and test keys only.
//! - `ephemeral = false`: the engine asks its [`MasterKeySource`] for the
//!   process's master secret, passing the [`PasswordData`] that explains why.
//!
//! The passphrase itself is never used as a key; the key codec hashes it first.

use std::env;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use super::error::{CryptoError, CryptoResult};
use super::secret::SecretBytes;

/// Passphrase used for keys encoded in ephemeral mode
pub const EPHEMERAL_PASSPHRASE: &str = "test";

/// Context handed to a master-key source (e.g. shown in an unlock prompt)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordData {
    reason: String,
}

impl PasswordData {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Supplies the process's master secret for non-ephemeral keys
pub trait MasterKeySource: Send + Sync {
    fn master_key(&self, data: &PasswordData) -> CryptoResult<SecretBytes>;
}

fn not_cached() -> CryptoError {
    CryptoError::key_unavailable("master_key", "master passphrase is not available")
}

/// Master secret held in memory after the user unlocks
#[derive(Default)]
pub struct CachedMasterKey {
    secret: RwLock<Option<SecretBytes>>,
}

impl CachedMasterKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: SecretBytes) -> Self {
        Self {
            secret: RwLock::new(Some(secret)),
        }
    }

    // A poisoned lock still holds a valid Option; recover it so that clear()
    // always wipes.
    fn write_guard(&self) -> RwLockWriteGuard<'_, Option<SecretBytes>> {
        self.secret.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Option<SecretBytes>> {
        self.secret.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, secret: SecretBytes) {
        *self.write_guard() = Some(secret);
    }

    /// Forget the cached secret (wiped on drop)
    pub fn clear(&self) {
        self.write_guard().take();
    }

    pub fn is_cached(&self) -> bool {
        self.read_guard().is_some()
    }
}

impl MasterKeySource for CachedMasterKey {
    fn master_key(&self, _data: &PasswordData) -> CryptoResult<SecretBytes> {
        self.read_guard().as_ref().cloned().ok_or_else(not_cached)
    }
}

/// Master secret read from an environment variable on first use, then cached
pub struct EnvMasterKey {
    var: String,
    cache: CachedMasterKey,
}

impl EnvMasterKey {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            cache: CachedMasterKey::new(),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl MasterKeySource for EnvMasterKey {
    fn master_key(&self, data: &PasswordData) -> CryptoResult<SecretBytes> {
        if self.cache.is_cached() {
            return self.cache.master_key(data);
        }

        let value = env::var(&self.var).map_err(|_| {
            warn!("{} not set; cannot unlock master key ({})", self.var, data.reason());
            not_cached()
        })?;
        if value.is_empty() {
            return Err(not_cached());
        }

        let secret = SecretBytes::new(value.into_bytes());
        self.cache.set(secret.clone());
        // Log success WITHOUT logging the passphrase
        info!("✅ Master passphrase loaded from {}", self.var);
        Ok(secret)
    }
}
