// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::crypto::{CryptoProvider, HashType, SymmetricMode, EPHEMERAL_PASSPHRASE};

/// Environment variable holding the master passphrase by default
pub const DEFAULT_MASTER_KEY_ENV: &str = "KEYSEAL_MASTER_KEY";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Digest used for contract signatures
    pub default_digest: HashType,
    /// Cipher named in new envelope templates
    pub default_cipher: SymmetricMode,
    /// HMAC used to rebind the ECDH secret in new envelopes
    pub default_hmac: HashType,
    /// Passphrase for keys encoded in ephemeral mode
    pub ephemeral_passphrase: String,
    /// Environment variable read by `EnvMasterKey`
    pub master_key_env: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_digest: HashType::Sha256,
            default_cipher: SymmetricMode::Aes256Gcm,
            default_hmac: HashType::Sha256,
            ephemeral_passphrase: EPHEMERAL_PASSPHRASE.to_string(),
            master_key_env: DEFAULT_MASTER_KEY_ENV.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the `[engine]` table of a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_value: toml::Value = toml::from_str(&content)?;

        let config: EngineConfig = match toml_value.get("engine") {
            Some(table) => table.clone().try_into()?,
            None => EngineConfig::default(),
        };

        Ok(config)
    }

    /// Defaults overridden by `KEYSEAL_DIGEST`, `KEYSEAL_CIPHER`, `KEYSEAL_HMAC`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("KEYSEAL_DIGEST") {
            match val.parse() {
                Ok(hash) => self.default_digest = hash,
                Err(e) => tracing::warn!("Ignoring KEYSEAL_DIGEST: {}", e),
            }
        }

        if let Ok(val) = std::env::var("KEYSEAL_CIPHER") {
            match val.parse() {
                Ok(mode) => self.default_cipher = mode,
                Err(e) => tracing::warn!("Ignoring KEYSEAL_CIPHER: {}", e),
            }
        }

        if let Ok(val) = std::env::var("KEYSEAL_HMAC") {
            match val.parse() {
                Ok(hash) => self.default_hmac = hash,
                Err(e) => tracing::warn!("Ignoring KEYSEAL_HMAC: {}", e),
            }
        }

        self
    }

    /// Reject settings the provider cannot honour
    pub fn validate(&self, provider: &dyn CryptoProvider) -> Result<()> {
        if !provider.hmac_supported(self.default_hmac) {
            return Err(anyhow!(
                "default_hmac '{}' cannot be used for HMAC",
                self.default_hmac
            ));
        }
        if self.ephemeral_passphrase.is_empty() {
            return Err(anyhow!("ephemeral_passphrase must not be empty"));
        }
        if self.master_key_env.is_empty() {
            return Err(anyhow!("master_key_env must not be empty"));
        }
        Ok(())
    }
}
