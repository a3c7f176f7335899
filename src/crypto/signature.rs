// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDSA Contract Signatures
//!
//! Signs and verifies the digest of canonical contract text with secp256k1
//! ECDSA. Signatures are hedged: RFC 6979 nonces mixed with randomness drawn
//! from the engine's [`CurveContext`].
//!
//! ## Wire Format (version 1)
//!
//! ```text
//! [ version: 1 byte = 0x01 ][ r: 32 bytes big-endian ][ s: 32 bytes big-endian ]
//! ```
//!
//! 65 bytes, fixed size, low-S. Not DER. Anything else is rejected with
//! `SignatureFormatMismatch` before any curve arithmetic happens.

use std::fmt;
use std::sync::Arc;

use k256::ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use tracing::{debug, error};

use super::context::CurveContext;
use super::error::{CryptoError, CryptoResult};
use super::key_codec::{secret_key, KeyCodec, KeyHandle};
use super::master_key::PasswordData;
use super::provider::{CryptoProvider, HashType};

/// Current signature wire-format version
pub const SIGNATURE_VERSION: u8 = 0x01;

/// Size of an encoded signature in bytes
pub const SIGNATURE_SIZE: usize = 65;

/// Encoded signature as stored alongside a contract
#[derive(Clone, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Wrap wire bytes after checking size and version
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        decode_signature(bytes)?;
        let mut wire = [0u8; SIGNATURE_SIZE];
        wire.copy_from_slice(bytes);
        Ok(Self(wire))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

/// Native signature → wire form
pub fn encode_signature(signature: &EcdsaSignature) -> Signature {
    let mut wire = [0u8; SIGNATURE_SIZE];
    wire[0] = SIGNATURE_VERSION;
    wire[1..].copy_from_slice(&signature.to_bytes());
    Signature(wire)
}

/// Wire form → native signature
pub fn decode_signature(bytes: &[u8]) -> CryptoResult<EcdsaSignature> {
    if bytes.len() != SIGNATURE_SIZE {
        return Err(CryptoError::SignatureFormatMismatch {
            reason: format!("expected {} bytes, got {}", SIGNATURE_SIZE, bytes.len()),
        });
    }
    if bytes[0] != SIGNATURE_VERSION {
        return Err(CryptoError::SignatureFormatMismatch {
            reason: format!("unknown signature version {:#04x}", bytes[0]),
        });
    }
    EcdsaSignature::from_slice(&bytes[1..]).map_err(|_| CryptoError::SignatureFormatMismatch {
        reason: "r or s out of range".to_string(),
    })
}

pub struct SignatureEngine {
    context: Arc<CurveContext>,
    provider: Arc<dyn CryptoProvider>,
    codec: Arc<KeyCodec>,
}

impl SignatureEngine {
    pub fn new(
        context: Arc<CurveContext>,
        provider: Arc<dyn CryptoProvider>,
        codec: Arc<KeyCodec>,
    ) -> Self {
        Self {
            context,
            provider,
            codec,
        }
    }

    /// Sign `contract` with the private half of `key`
    pub fn sign(
        &self,
        contract: impl AsRef<[u8]>,
        key: &KeyHandle,
        hash: HashType,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<Signature> {
        let digest = self.provider.digest(hash, contract.as_ref()).map_err(|e| {
            error!("Failed to obtain the contract hash ({})", hash);
            e
        })?;

        let scalar = self.codec.private_scalar(key, data, ephemeral).map_err(|e| {
            error!("Can not extract ecdsa private key: {}", e);
            e
        })?;
        let signing_key = SigningKey::from(secret_key(&scalar, "ecdsa_sign")?);

        let mut rng = self.context.hedging_rng();
        let signature: EcdsaSignature = signing_key
            .sign_prehash_with_rng(&mut rng, &digest)
            .map_err(|_| {
                error!("ECDSA signing primitive failed");
                CryptoError::operation("ecdsa_sign", "signing primitive failed")
            })?;
        let signature = signature.normalize_s().unwrap_or(signature);

        Ok(encode_signature(&signature))
    }

    /// Fail-closed verification: anything that is not a valid signature by
    /// `key` over `contract` is `false`.
    pub fn verify(
        &self,
        contract: impl AsRef<[u8]>,
        key: &KeyHandle,
        signature: &[u8],
        hash: HashType,
    ) -> bool {
        match self.verify_detailed(contract, key, signature, hash) {
            Ok(verified) => verified,
            Err(e) => {
                debug!("Signature verification could not run: {}", e);
                false
            }
        }
    }

    /// Like [`verify`](Self::verify), but reports why verification could not run.
    ///
    /// `Ok(false)` means the inputs were well formed and the signature does not match.
    pub fn verify_detailed(
        &self,
        contract: impl AsRef<[u8]>,
        key: &KeyHandle,
        signature: &[u8],
        hash: HashType,
    ) -> CryptoResult<bool> {
        let digest = self.provider.digest(hash, contract.as_ref())?;
        let point = self.codec.public_point(key)?;
        let signature = decode_signature(signature)?;

        let verifying_key = VerifyingKey::from(&point);
        Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
    }
}
