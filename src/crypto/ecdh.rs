// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Agreement
//!
//! Computes the secp256k1 Diffie-Hellman secret between one party's private
//! scalar and another party's public point. The output is not the raw shared
//! point:
//!
//! ```text
//! secret = SHA-256( SEC1-compressed( peer_point * own_scalar ) )
//! ```
//!
//! which is the derivation libsecp256k1's ECDH module applies, so both sides
//! of an agreement get the same 32 bytes whichever implementation they run.
//! Callers must not hash it again as if it were raw DH output.

use std::sync::Arc;

use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha2::{Digest, Sha256};
use tracing::error;

use super::error::{CryptoError, CryptoResult};
use super::key_codec::{secret_key, KeyCodec, KeyHandle};
use super::master_key::PasswordData;
use super::secret::{PrivateScalar, SecretBytes};

/// Size of the agreed secret in bytes (same as a private scalar)
pub const SHARED_SECRET_SIZE: usize = 32;

/// Agreement on already-resolved key material
pub fn agree(scalar: &PrivateScalar, peer: &PublicKey) -> CryptoResult<SecretBytes> {
    let secret = secret_key(scalar, "ecdh")?;
    let product = peer.to_projective() * *secret.to_nonzero_scalar();

    if bool::from(product.is_identity()) {
        return Err(CryptoError::operation("ecdh", "shared point is at infinity"));
    }

    let compressed = product.to_affine().to_encoded_point(true);
    let digest = Sha256::digest(compressed.as_bytes());
    Ok(SecretBytes::from_slice(&digest))
}

pub struct EcdhAgreement {
    codec: Arc<KeyCodec>,
}

impl EcdhAgreement {
    pub fn new(codec: Arc<KeyCodec>) -> Self {
        Self { codec }
    }

    /// Shared secret between the private half of `own` and the public half of `peer`
    pub fn shared_secret(
        &self,
        own: &KeyHandle,
        peer: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<SecretBytes> {
        let scalar = self.codec.private_scalar(own, data, ephemeral).map_err(|e| {
            error!("ECDH could not obtain private key: {}", e);
            e
        })?;

        let point = self.codec.public_point(peer).map_err(|e| {
            error!("ECDH could not obtain public key: {}", e);
            e
        })?;

        agree(&scalar, &point)
    }
}
