// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hash and Symmetric-Cipher Provider
//!
//! The engine never calls a digest or AEAD implementation directly. It goes
//! through [`CryptoProvider`], which is resolved by algorithm name at the call
//! boundary, so a different back end can be injected without touching the
//! signature, ECDH or envelope code.
//!
//! ## Supported Algorithms ([`RustCryptoProvider`])
//!
//! | Name                 | Kind   | Key | IV | Tag |
//! |----------------------|--------|-----|----|-----|
//! | `sha256`             | digest, HMAC | | | |
//! | `sha512`             | digest, HMAC | | | |
//! | `blake3`             | digest | | | |
//! | `aes-256-gcm`        | AEAD   | 32  | 12 | 16  |
//! | `chacha20-poly1305`  | AEAD   | 32  | 12 | 16  |
//! | `xchacha20-poly1305` | AEAD   | 32  | 24 | 16  |

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::generic_array::{typenum::Unsigned, GenericArray};
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use super::error::{CryptoError, CryptoResult};
use super::secret::SecretBytes;

/// Digest algorithms known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    Sha256,
    Sha512,
    Blake3,
}

impl HashType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashType::Sha256 => "sha256",
            HashType::Sha512 => "sha512",
            HashType::Blake3 => "blake3",
        }
    }

    /// Output size in bytes
    pub fn digest_size(&self) -> usize {
        match self {
            HashType::Sha256 => 32,
            HashType::Sha512 => 64,
            HashType::Blake3 => 32,
        }
    }
}

impl FromStr for HashType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(HashType::Sha256),
            "sha512" => Ok(HashType::Sha512),
            "blake3" => Ok(HashType::Blake3),
            _ => Err(CryptoError::UnsupportedHashFunction {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated symmetric ciphers known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetricMode {
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
    #[serde(rename = "xchacha20-poly1305")]
    XChaCha20Poly1305,
}

impl SymmetricMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymmetricMode::Aes256Gcm => "aes-256-gcm",
            SymmetricMode::ChaCha20Poly1305 => "chacha20-poly1305",
            SymmetricMode::XChaCha20Poly1305 => "xchacha20-poly1305",
        }
    }

    pub fn key_size(&self) -> usize {
        32
    }

    pub fn iv_size(&self) -> usize {
        match self {
            SymmetricMode::Aes256Gcm | SymmetricMode::ChaCha20Poly1305 => 12,
            SymmetricMode::XChaCha20Poly1305 => 24,
        }
    }

    pub fn tag_size(&self) -> usize {
        16
    }
}

impl FromStr for SymmetricMode {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-gcm" | "aes256gcm" => Ok(SymmetricMode::Aes256Gcm),
            "chacha20-poly1305" | "chacha20poly1305" => Ok(SymmetricMode::ChaCha20Poly1305),
            "xchacha20-poly1305" | "xchacha20poly1305" => Ok(SymmetricMode::XChaCha20Poly1305),
            _ => Err(CryptoError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SymmetricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ciphertext and detached authentication tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadOutput {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Digest, HMAC and AEAD capabilities consumed by the engine
pub trait CryptoProvider: Send + Sync {
    fn digest(&self, hash: HashType, data: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Whether `hmac` accepts this hash. Checked before key material is touched.
    fn hmac_supported(&self, hash: HashType) -> bool;

    fn hmac(&self, hash: HashType, key: &[u8], data: &[u8]) -> CryptoResult<SecretBytes>;

    fn key_size(&self, mode: SymmetricMode) -> usize {
        mode.key_size()
    }

    fn iv_size(&self, mode: SymmetricMode) -> usize {
        mode.iv_size()
    }

    fn aead_encrypt(
        &self,
        mode: SymmetricMode,
        key: &SecretBytes,
        iv: &[u8],
        plaintext: &[u8],
    ) -> CryptoResult<AeadOutput>;

    /// Decrypt and verify. Every failure is the same uniform authentication error.
    fn aead_decrypt(
        &self,
        mode: SymmetricMode,
        key: &SecretBytes,
        iv: &[u8],
        tag: &[u8],
        ciphertext: &[u8],
    ) -> CryptoResult<SecretBytes>;
}

/// Default provider backed by the RustCrypto crates and blake3
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    pub fn new() -> Self {
        Self
    }
}

fn encrypt_detached<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> CryptoResult<AeadOutput>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::operation("aead_encrypt", "invalid key length"))?;

    if iv.len() != <C as AeadCore>::NonceSize::USIZE {
        return Err(CryptoError::operation(
            "aead_encrypt",
            format!(
                "invalid IV length: expected {}, got {}",
                <C as AeadCore>::NonceSize::USIZE,
                iv.len()
            ),
        ));
    }
    let nonce = GenericArray::from_slice(iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, b"", &mut buffer)
        .map_err(|_| CryptoError::operation("aead_encrypt", "encryption failed"))?;

    Ok(AeadOutput {
        ciphertext: buffer,
        tag: tag.to_vec(),
    })
}

fn decrypt_detached<C>(
    key: &[u8],
    iv: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> CryptoResult<SecretBytes>
where
    C: AeadInPlace + KeyInit,
{
    let cipher =
        C::new_from_slice(key).map_err(|_| CryptoError::authentication("aead_decrypt"))?;

    if iv.len() != <C as AeadCore>::NonceSize::USIZE
        || tag.len() != <C as AeadCore>::TagSize::USIZE
    {
        return Err(CryptoError::authentication("aead_decrypt"));
    }
    let nonce = GenericArray::from_slice(iv);
    let tag = GenericArray::from_slice(tag);

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(nonce, b"", &mut *buffer, tag)
        .map_err(|_| CryptoError::authentication("aead_decrypt"))?;

    Ok(SecretBytes::from_slice(&buffer))
}

impl CryptoProvider for RustCryptoProvider {
    fn digest(&self, hash: HashType, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let digest = match hash {
            HashType::Sha256 => Sha256::digest(data).to_vec(),
            HashType::Sha512 => Sha512::digest(data).to_vec(),
            HashType::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        };
        Ok(digest)
    }

    fn hmac_supported(&self, hash: HashType) -> bool {
        matches!(hash, HashType::Sha256 | HashType::Sha512)
    }

    fn hmac(&self, hash: HashType, key: &[u8], data: &[u8]) -> CryptoResult<SecretBytes> {
        match hash {
            HashType::Sha256 => {
                let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
                    .map_err(|e| CryptoError::operation("hmac", e))?;
                mac.update(data);
                Ok(SecretBytes::from_slice(&mac.finalize().into_bytes()))
            }
            HashType::Sha512 => {
                let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key)
                    .map_err(|e| CryptoError::operation("hmac", e))?;
                mac.update(data);
                Ok(SecretBytes::from_slice(&mac.finalize().into_bytes()))
            }
            HashType::Blake3 => Err(CryptoError::UnsupportedHashFunction {
                name: hash.as_str().to_string(),
            }),
        }
    }

    fn aead_encrypt(
        &self,
        mode: SymmetricMode,
        key: &SecretBytes,
        iv: &[u8],
        plaintext: &[u8],
    ) -> CryptoResult<AeadOutput> {
        match mode {
            SymmetricMode::Aes256Gcm => encrypt_detached::<Aes256Gcm>(key.as_bytes(), iv, plaintext),
            SymmetricMode::ChaCha20Poly1305 => {
                encrypt_detached::<ChaCha20Poly1305>(key.as_bytes(), iv, plaintext)
            }
            SymmetricMode::XChaCha20Poly1305 => {
                encrypt_detached::<XChaCha20Poly1305>(key.as_bytes(), iv, plaintext)
            }
        }
    }

    fn aead_decrypt(
        &self,
        mode: SymmetricMode,
        key: &SecretBytes,
        iv: &[u8],
        tag: &[u8],
        ciphertext: &[u8],
    ) -> CryptoResult<SecretBytes> {
        match mode {
            SymmetricMode::Aes256Gcm => {
                decrypt_detached::<Aes256Gcm>(key.as_bytes(), iv, tag, ciphertext)
            }
            SymmetricMode::ChaCha20Poly1305 => {
                decrypt_detached::<ChaCha20Poly1305>(key.as_bytes(), iv, tag, ciphertext)
            }
            SymmetricMode::XChaCha20Poly1305 => {
                decrypt_detached::<XChaCha20Poly1305>(key.as_bytes(), iv, tag, ciphertext)
            }
        }
    }
}
