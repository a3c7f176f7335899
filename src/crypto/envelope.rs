// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session-Key Envelopes
//!
//! Seals a symmetric session key to a peer with ECDH + nonce rebinding + AEAD,
//! and opens such envelopes on the receiving side.
//!
//! ## Protocol
//!
//! ```text
//! nonce      = random(KeySize(cipher))              // sized by KEY, not IV
//! shared     = ECDH(own_private, peer_public)       // already hashed, see ecdh.rs
//! per_use    = HMAC(hmac, key = shared, data = nonce)
//! key, iv    = per_use[..KeySize], nonce[..IVSize]
//! ct, tag    = AEAD(cipher, key, iv, session_key)
//! envelope   = { cipher, hmac, Base58Check(nonce), Base58Check(tag), Armor(ct) }
//! ```
//!
//! The ECDH secret is identical for every seal between the same two keys; the
//! fresh nonce is what makes each envelope use a different encryption key.
//! Seal and open must derive and truncate identically, so both go through
//! [`EnvelopeSealer::derive_key_material`].
//!
//! The sender seals with (own private, recipient public); the recipient opens
//! with (own private, sender public).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::ecdh::EcdhAgreement;
use super::encoding::{
    armor, base58check_decode, base58check_encode, dearmor, max_base58check_len, Nonce,
};
use super::error::{CryptoError, CryptoResult};
use super::key_codec::KeyHandle;
use super::master_key::PasswordData;
use super::provider::{CryptoProvider, HashType, SymmetricMode};
use super::secret::SecretBytes;

/// Sealed session key plus everything needed to open it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricEnvelope {
    pub cipher_algorithm: String,
    pub hmac_algorithm: String,
    /// Base58Check of the raw nonce
    pub nonce: String,
    /// Base58Check of the AEAD tag
    pub tag: String,
    /// Armored AEAD ciphertext
    pub ciphertext: String,
}

impl SymmetricEnvelope {
    /// Empty envelope naming the algorithms to seal with
    pub fn template(cipher: SymmetricMode, hmac: HashType) -> Self {
        Self::template_named(cipher.as_str(), hmac.as_str())
    }

    pub fn template_named(cipher: &str, hmac: &str) -> Self {
        Self {
            cipher_algorithm: cipher.to_string(),
            hmac_algorithm: hmac.to_string(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        [
            &self.cipher_algorithm,
            &self.hmac_algorithm,
            &self.nonce,
            &self.tag,
            &self.ciphertext,
        ]
        .iter()
        .all(|field| !field.is_empty())
    }
}

fn required<'a>(field: &str, value: &'a str) -> CryptoResult<&'a str> {
    if value.is_empty() {
        return Err(CryptoError::decode(field, "field is missing"));
    }
    Ok(value)
}

/// Base58Check-decode a field that holds at most `max_raw` bytes.
///
/// Over-long text is rejected before decoding, which is quadratic in length.
fn decode_bounded(field: &str, value: &str, max_raw: usize) -> CryptoResult<Vec<u8>> {
    let value = required(field, value)?;
    let limit = max_base58check_len(max_raw);
    if value.len() > limit {
        return Err(CryptoError::decode(
            field,
            format!("encoded value exceeds {} characters", limit),
        ));
    }
    base58check_decode(value).map_err(|_| CryptoError::decode(field, "invalid Base58Check"))
}

pub struct EnvelopeSealer {
    provider: Arc<dyn CryptoProvider>,
    ecdh: Arc<EcdhAgreement>,
}

impl EnvelopeSealer {
    pub fn new(provider: Arc<dyn CryptoProvider>, ecdh: Arc<EcdhAgreement>) -> Self {
        Self { provider, ecdh }
    }

    fn resolve_algorithms(&self, envelope: &SymmetricEnvelope) -> CryptoResult<(SymmetricMode, HashType)> {
        let mode: SymmetricMode = envelope.cipher_algorithm.parse().map_err(|e| {
            error!("Unsupported encryption algorithm: {}", envelope.cipher_algorithm);
            e
        })?;

        let hmac: HashType = envelope.hmac_algorithm.parse().map_err(|e| {
            error!("Unsupported hmac algorithm: {}", envelope.hmac_algorithm);
            e
        })?;
        if !self.provider.hmac_supported(hmac) {
            error!("Unsupported hmac algorithm: {}", envelope.hmac_algorithm);
            return Err(CryptoError::UnsupportedHashFunction {
                name: envelope.hmac_algorithm.clone(),
            });
        }

        Ok((mode, hmac))
    }

    /// Per-use key and IV for one envelope. Shared by seal and open.
    #[allow(clippy::too_many_arguments)]
    fn derive_key_material(
        &self,
        mode: SymmetricMode,
        hmac: HashType,
        nonce: &[u8],
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<(SecretBytes, Vec<u8>)> {
        let shared = self.ecdh.shared_secret(own, peer, data, ephemeral).map_err(|e| {
            error!("ECDH shared secret negotiation failed");
            e
        })?;

        // Never use the ECDH secret directly: rebinding it to the nonce gives
        // every envelope its own key, even between the same pair of keys.
        let per_use = self.provider.hmac(hmac, shared.as_bytes(), nonce)?;

        let key_size = self.provider.key_size(mode);
        let iv_size = self.provider.iv_size(mode);

        if per_use.len() < key_size {
            error!("Insufficient key size for {}", mode);
            return Err(CryptoError::InsufficientEntropy {
                what: "key".to_string(),
                required: key_size,
                available: per_use.len(),
            });
        }
        if nonce.len() < iv_size {
            error!("Insufficient nonce size for {}", mode);
            return Err(CryptoError::InsufficientEntropy {
                what: "nonce".to_string(),
                required: iv_size,
                available: nonce.len(),
            });
        }

        Ok((per_use.truncated(key_size), nonce[..iv_size].to_vec()))
    }

    /// Seal `session_key` from `own` to `peer`.
    ///
    /// `template` supplies the algorithm names; its other fields are ignored.
    /// On error no envelope exists.
    pub fn seal(
        &self,
        session_key: &SecretBytes,
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
        template: &SymmetricEnvelope,
    ) -> CryptoResult<SymmetricEnvelope> {
        let (mode, hmac) = self.resolve_algorithms(template)?;

        if session_key.is_empty() {
            return Err(CryptoError::operation("envelope_seal", "session key is empty"));
        }

        let nonce = Nonce::generate(self.provider.key_size(mode));
        let (key, iv) =
            self.derive_key_material(mode, hmac, &nonce.raw, own, peer, data, ephemeral)?;

        let sealed = self
            .provider
            .aead_encrypt(mode, &key, &iv, session_key.as_bytes())
            .map_err(|e| {
                error!("Session key encryption failed");
                e
            })?;

        let envelope = SymmetricEnvelope {
            cipher_algorithm: mode.as_str().to_string(),
            hmac_algorithm: hmac.as_str().to_string(),
            nonce: nonce.encoded,
            tag: base58check_encode(&sealed.tag),
            ciphertext: armor(&sealed.ciphertext)?,
        };

        debug!("🔒 Session key sealed ({}, hmac-{})", mode, hmac);
        Ok(envelope)
    }

    /// Open an envelope addressed to `own`, sealed by `peer`
    pub fn open(
        &self,
        envelope: &SymmetricEnvelope,
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<SecretBytes> {
        let (mode, hmac) = self.resolve_algorithms(envelope)?;

        let nonce_size = self.provider.key_size(mode);
        let nonce = decode_bounded("nonce", &envelope.nonce, nonce_size).map_err(|e| {
            error!("Can not decode nonce");
            e
        })?;
        if nonce.len() != nonce_size {
            error!("Nonce is {} bytes, {} needs {}", nonce.len(), mode, nonce_size);
            return Err(CryptoError::decode(
                "nonce",
                format!("expected {} bytes, got {}", nonce_size, nonce.len()),
            ));
        }
        let tag = decode_bounded("tag", &envelope.tag, mode.tag_size())?;
        let ciphertext = dearmor(required("ciphertext", &envelope.ciphertext)?)
            .map_err(|_| CryptoError::decode("ciphertext", "invalid armor"))?;

        let (key, iv) = self.derive_key_material(mode, hmac, &nonce, own, peer, data, ephemeral)?;

        let session_key = self
            .provider
            .aead_decrypt(mode, &key, &iv, &tag, &ciphertext)
            .map_err(|_| {
                debug!("Envelope failed authentication");
                CryptoError::authentication("envelope_open")
            })?;

        debug!("🔓 Session key opened ({}, hmac-{})", mode, hmac);
        Ok(session_key)
    }
}
