// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! secp256k1 Engine
//!
//! Owns one [`CurveContext`], one [`CryptoProvider`] and one [`KeyCodec`], and
//! builds the signature, ECDH and envelope components around them. There is
//! no global instance: construct one at startup and share it (`Arc`) with
//! whoever needs it.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use keyseal::config::EngineConfig;
//! use keyseal::crypto::{CachedMasterKey, KeyHandle, PasswordData, Secp256k1Engine};
//!
//! # fn run(alice: KeyHandle, bob_public: KeyHandle) -> anyhow::Result<()> {
//! let engine = Secp256k1Engine::new(EngineConfig::default(), Arc::new(CachedMasterKey::new()))?;
//! let pw = PasswordData::new("sign contract");
//!
//! let signature = engine.sign("contract text", &alice, &pw, true)?;
//! assert!(engine.verify("contract text", &alice.to_public(), signature.as_bytes()));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::context::CurveContext;
use super::ecdh::EcdhAgreement;
use super::envelope::{EnvelopeSealer, SymmetricEnvelope};
use super::error::CryptoResult;
use super::key_codec::{KeyCodec, KeyHandle};
use super::master_key::{MasterKeySource, PasswordData};
use super::provider::{CryptoProvider, RustCryptoProvider};
use super::secret::SecretBytes;
use super::signature::{Signature, SignatureEngine};
use crate::config::EngineConfig;

pub struct Secp256k1Engine {
    config: EngineConfig,
    context: Arc<CurveContext>,
    codec: Arc<KeyCodec>,
    signatures: SignatureEngine,
    ecdh: Arc<EcdhAgreement>,
    envelopes: EnvelopeSealer,
}

impl Secp256k1Engine {
    /// Engine backed by [`RustCryptoProvider`]
    pub fn new(config: EngineConfig, master_keys: Arc<dyn MasterKeySource>) -> Result<Self> {
        Self::with_provider(config, Arc::new(RustCryptoProvider::new()), master_keys)
    }

    pub fn with_provider(
        config: EngineConfig,
        provider: Arc<dyn CryptoProvider>,
        master_keys: Arc<dyn MasterKeySource>,
    ) -> Result<Self> {
        config.validate(provider.as_ref())?;

        let context = Arc::new(CurveContext::new());
        let codec = Arc::new(
            KeyCodec::new(Arc::clone(&provider), master_keys)
                .with_ephemeral_passphrase(&config.ephemeral_passphrase),
        );
        let signatures = SignatureEngine::new(
            Arc::clone(&context),
            Arc::clone(&provider),
            Arc::clone(&codec),
        );
        let ecdh = Arc::new(EcdhAgreement::new(Arc::clone(&codec)));
        let envelopes = EnvelopeSealer::new(Arc::clone(&provider), Arc::clone(&ecdh));

        if context.randomize() {
            info!("✅ secp256k1 engine initialized");
        }

        Ok(Self {
            config,
            context,
            codec,
            signatures,
            ecdh,
            envelopes,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<CurveContext> {
        &self.context
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn signatures(&self) -> &SignatureEngine {
        &self.signatures
    }

    pub fn ecdh(&self) -> &EcdhAgreement {
        &self.ecdh
    }

    pub fn envelopes(&self) -> &EnvelopeSealer {
        &self.envelopes
    }

    /// Envelope template using the configured cipher and HMAC
    pub fn envelope_template(&self) -> SymmetricEnvelope {
        SymmetricEnvelope::template(self.config.default_cipher, self.config.default_hmac)
    }

    /// Sign with the configured digest
    pub fn sign(
        &self,
        contract: impl AsRef<[u8]>,
        key: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<Signature> {
        self.signatures
            .sign(contract, key, self.config.default_digest, data, ephemeral)
    }

    /// Verify with the configured digest
    pub fn verify(&self, contract: impl AsRef<[u8]>, key: &KeyHandle, signature: &[u8]) -> bool {
        self.signatures
            .verify(contract, key, signature, self.config.default_digest)
    }

    pub fn shared_secret(
        &self,
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<SecretBytes> {
        self.ecdh.shared_secret(own, peer, data, ephemeral)
    }

    /// Seal with the configured cipher and HMAC
    pub fn seal(
        &self,
        session_key: &SecretBytes,
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<SymmetricEnvelope> {
        self.envelopes.seal(
            session_key,
            own,
            peer,
            data,
            ephemeral,
            &self.envelope_template(),
        )
    }

    pub fn open(
        &self,
        envelope: &SymmetricEnvelope,
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<SecretBytes> {
        self.envelopes.open(envelope, own, peer, data, ephemeral)
    }
}
