// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key Codec
//!
//! Converts between k256's internal key types and the encoded strings that
//! the key-owning entity stores.
//!
//! ## Formats
//!
//! ```text
//! EncodedPublicKey  = Base58Check( SEC1 uncompressed point, 65 bytes )
//! EncodedPrivateKey = Base58Check( AES-256-ECB( scalar, SHA-256(master passphrase) ) )
//! ```
//!
//! The private form uses ECB with no IV and no padding: the 32-byte scalar is
//! exactly two AES blocks. Decoding accepts one or two blocks. Compressed SEC1
//! points (33 bytes) are accepted on decode.

use std::fmt;
use std::sync::Arc;

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use zeroize::Zeroizing;

use super::encoding::{base58check_decode, base58check_encode};
use super::error::{CryptoError, CryptoResult};
use super::master_key::{MasterKeySource, PasswordData, EPHEMERAL_PASSPHRASE};
use super::provider::{CryptoProvider, HashType};
use super::secret::{PrivateScalar, SecretBytes, PRIVATE_KEY_SIZE};

const AES_BLOCK_SIZE: usize = 16;

/// Base58Check string holding a SEC1-encoded public point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPublicKey(String);

impl EncodedPublicKey {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base58Check string holding a passphrase-encrypted private scalar
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPrivateKey(String);

impl EncodedPrivateKey {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncodedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedPrivateKey({} chars)", self.0.len())
    }
}

/// An asymmetric key as stored by its owner: either half may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHandle {
    pub public: Option<EncodedPublicKey>,
    pub private: Option<EncodedPrivateKey>,
}

impl KeyHandle {
    pub fn new(public: EncodedPublicKey, private: EncodedPrivateKey) -> Self {
        Self {
            public: Some(public),
            private: Some(private),
        }
    }

    pub fn public_only(public: EncodedPublicKey) -> Self {
        Self {
            public: Some(public),
            private: None,
        }
    }

    /// The same key without its private half, as handed to peers
    pub fn to_public(&self) -> Self {
        Self {
            public: self.public.clone(),
            private: None,
        }
    }
}

/// Convert a raw scalar into a k256 secret key.
///
/// Zero or out-of-range scalars are a primitive failure, not a decode failure.
pub(crate) fn secret_key(scalar: &PrivateScalar, operation: &str) -> CryptoResult<SecretKey> {
    SecretKey::from_slice(scalar.as_bytes())
        .map_err(|_| CryptoError::operation(operation, "invalid private scalar"))
}

pub struct KeyCodec {
    provider: Arc<dyn CryptoProvider>,
    master_keys: Arc<dyn MasterKeySource>,
    ephemeral_passphrase: SecretBytes,
}

impl KeyCodec {
    pub fn new(provider: Arc<dyn CryptoProvider>, master_keys: Arc<dyn MasterKeySource>) -> Self {
        Self {
            provider,
            master_keys,
            ephemeral_passphrase: SecretBytes::from(EPHEMERAL_PASSPHRASE),
        }
    }

    pub fn with_ephemeral_passphrase(mut self, passphrase: &str) -> Self {
        self.ephemeral_passphrase = SecretBytes::from(passphrase);
        self
    }

    // -- public keys --------------------------------------------------------

    pub fn decode_public_key(&self, encoded: &EncodedPublicKey) -> CryptoResult<PublicKey> {
        let serialized = base58check_decode(encoded.as_str()).map_err(|e| {
            debug!("Could not decode base58 public key");
            e
        })?;

        PublicKey::from_sec1_bytes(&serialized).map_err(|_| {
            CryptoError::key_unavailable("public_key", "not a valid secp256k1 point")
        })
    }

    pub fn encode_public_key(&self, point: &PublicKey) -> EncodedPublicKey {
        let serialized = point.to_encoded_point(false);
        EncodedPublicKey(base58check_encode(serialized.as_bytes()))
    }

    /// Public point of a private scalar
    pub fn public_key_for(&self, scalar: &PrivateScalar) -> CryptoResult<PublicKey> {
        Ok(secret_key(scalar, "public_key_derivation")?.public_key())
    }

    pub fn public_point(&self, handle: &KeyHandle) -> CryptoResult<PublicKey> {
        let encoded = handle
            .public
            .as_ref()
            .ok_or_else(|| CryptoError::key_unavailable("public_key", "key has no public half"))?;
        self.decode_public_key(encoded)
    }

    // -- private keys -------------------------------------------------------

    fn resolve_passphrase(&self, data: &PasswordData, ephemeral: bool) -> CryptoResult<SecretBytes> {
        if ephemeral {
            Ok(self.ephemeral_passphrase.clone())
        } else {
            self.master_keys.master_key(data)
        }
    }

    /// AES key = SHA-256(passphrase)
    fn passphrase_key(&self, data: &PasswordData, ephemeral: bool) -> CryptoResult<SecretBytes> {
        let passphrase = self.resolve_passphrase(data, ephemeral)?;
        let digest = self
            .provider
            .digest(HashType::Sha256, passphrase.as_bytes())
            .map_err(|e| {
                error!("Failed to hash master passphrase");
                e
            })?;
        Ok(SecretBytes::new(digest))
    }

    pub fn decode_private_key(
        &self,
        encoded: &EncodedPrivateKey,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<PrivateScalar> {
        let encrypted = base58check_decode(encoded.as_str()).map_err(|_| {
            error!("Could not decode base58 encrypted private key");
            CryptoError::key_unavailable("private_key", "invalid Base58Check encoding")
        })?;

        let key = self.passphrase_key(data, ephemeral)?;
        let decrypted = ecb_decrypt(&key, &encrypted)?;

        let scalar = PrivateScalar::from_slice(&decrypted)
            .map_err(|_| CryptoError::authentication("private_key_decrypt"))?;
        // A wrong passphrase yields a random-looking block; reject anything that
        // is not a usable scalar with the same uniform error.
        secret_key(&scalar, "private_key_decrypt")
            .map_err(|_| CryptoError::authentication("private_key_decrypt"))?;
        Ok(scalar)
    }

    pub fn encode_private_key(
        &self,
        scalar: &PrivateScalar,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<EncodedPrivateKey> {
        let key = self.passphrase_key(data, ephemeral)?;
        let encrypted = ecb_encrypt(&key, scalar.as_bytes())?;
        Ok(EncodedPrivateKey(base58check_encode(&encrypted)))
    }

    pub fn private_scalar(
        &self,
        handle: &KeyHandle,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<PrivateScalar> {
        let encoded = handle.private.as_ref().ok_or_else(|| {
            CryptoError::key_unavailable("private_key", "key has no private half")
        })?;
        self.decode_private_key(encoded, data, ephemeral)
    }

    /// Encode both halves of a scalar into a storable handle
    pub fn key_handle(
        &self,
        scalar: &PrivateScalar,
        data: &PasswordData,
        ephemeral: bool,
    ) -> CryptoResult<KeyHandle> {
        let public = self.encode_public_key(&self.public_key_for(scalar)?);
        let private = self.encode_private_key(scalar, data, ephemeral)?;
        Ok(KeyHandle::new(public, private))
    }
}

fn ecb_cipher(key: &SecretBytes) -> CryptoResult<Aes256> {
    Aes256::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::operation("aes_256_ecb", "invalid key length"))
}

fn valid_block_count(len: usize) -> bool {
    len > 0 && len % AES_BLOCK_SIZE == 0 && len <= PRIVATE_KEY_SIZE
}

fn ecb_encrypt(key: &SecretBytes, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    if !valid_block_count(plaintext.len()) {
        return Err(CryptoError::operation(
            "aes_256_ecb",
            format!("plaintext must be one or two blocks, got {} bytes", plaintext.len()),
        ));
    }
    let cipher = ecb_cipher(key)?;
    let mut buffer = plaintext.to_vec();
    for block in buffer.chunks_mut(AES_BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(buffer)
}

fn ecb_decrypt(key: &SecretBytes, ciphertext: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if !valid_block_count(ciphertext.len()) {
        return Err(CryptoError::authentication("private_key_decrypt"));
    }
    let cipher = ecb_cipher(key).map_err(|_| CryptoError::authentication("private_key_decrypt"))?;
    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    for block in buffer.chunks_mut(AES_BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(buffer)
}
