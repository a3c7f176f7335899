// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secret Buffers
//!
//! Owned byte buffers for private scalars, ECDH secrets, derived keys,
//! passphrases and session keys. Both types wipe their memory on drop, so
//! every exit path (including `?` early returns) leaves nothing behind.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{CryptoError, CryptoResult};

/// Size of a secp256k1 private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Variable-length secret, zeroized on drop
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the first `len` bytes. Caller checks the length first.
    pub fn truncated(&self, len: usize) -> Self {
        Self::from_slice(&self.0[..len.min(self.0.len())])
    }
}

impl From<&str> for SecretBytes {
    fn from(value: &str) -> Self {
        Self::from_slice(value.as_bytes())
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Eq for SecretBytes {}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

/// A secp256k1 private key in raw form.
///
/// Only ever handed to ECDSA signing, ECDH, or re-encryption by the key codec.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateScalar([u8; PRIVATE_KEY_SIZE]);

impl PrivateScalar {
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(CryptoError::key_unavailable(
                "private_key",
                format!(
                    "expected {} bytes, got {}",
                    PRIVATE_KEY_SIZE,
                    bytes.len()
                ),
            ));
        }
        let mut scalar = [0u8; PRIVATE_KEY_SIZE];
        scalar.copy_from_slice(bytes);
        Ok(Self(scalar))
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for PrivateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateScalar([REDACTED])")
    }
}
