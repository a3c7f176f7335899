// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Every failure the engine can report, with the non-secret context needed to
//! tell which stage failed.
//!
//! ## Error Variants
//!
//! - **UnsupportedAlgorithm**: symmetric cipher name not known to the provider
//! - **UnsupportedHashFunction**: digest/HMAC name not known to the provider
//! - **DecodeFailure**: Base58Check, armor or envelope field could not be decoded
//! - **KeyMaterialUnavailable**: a key half is missing, or could not be parsed
//! - **InsufficientEntropy**: derived key or nonce shorter than the cipher needs
//! - **SignatureFormatMismatch**: signature bytes are not the fixed wire form
//! - **CryptoOperationFailed**: a primitive (sign, ECDH, AEAD, AES) failed
//!
//! ## Uniform Failures
//!
//! Decryption and authentication failures always carry [`AUTHENTICATION_FAILED`]
//! as their reason, whatever the underlying cause (wrong key, tampered
//! ciphertext, bad tag), so callers cannot build an oracle out of the messages.

use thiserror::Error;

/// Reason reported for every decrypt/authenticate failure.
pub const AUTHENTICATION_FAILED: &str = "decryption or authentication failed";

/// Comprehensive error type for all cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Symmetric cipher name not recognised
    #[error("Unsupported encryption algorithm: {name}")]
    UnsupportedAlgorithm {
        /// Name as supplied by the caller or the envelope
        name: String,
    },

    /// Digest or HMAC name not recognised (or not usable for HMAC)
    #[error("Unsupported hash function: {name}")]
    UnsupportedHashFunction {
        /// Name as supplied by the caller or the envelope
        name: String,
    },

    /// Encoded input could not be decoded
    ///
    /// This error occurs when:
    /// - Base58Check checksum or alphabet is wrong
    /// - Armored text is not valid base64 or does not inflate
    /// - A required envelope field is empty
    #[error("Failed to decode {field}: {reason}")]
    DecodeFailure {
        /// Which field or value was being decoded
        field: String,
        /// Specific failure reason
        reason: String,
    },

    /// Key material could not be obtained
    ///
    /// This error occurs when:
    /// - The key handle has no public/private half
    /// - The encoded point is not on the curve
    /// - The encoded private key is not valid Base58Check
    /// - The master passphrase cannot be obtained
    #[error("Key material unavailable ({key_type}): {reason}")]
    KeyMaterialUnavailable {
        /// Type of key that failed (e.g. "public_key", "private_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Derived key or nonce too short for the selected cipher
    #[error("Insufficient entropy for {what}: need {required} bytes, have {available}")]
    InsufficientEntropy {
        /// "key" or "nonce"
        what: String,
        /// Bytes required by the cipher
        required: usize,
        /// Bytes actually available before truncation
        available: usize,
    },

    /// Signature bytes are not in the expected wire form
    #[error("Signature format mismatch: {reason}")]
    SignatureFormatMismatch {
        /// Specific failure reason
        reason: String,
    },

    /// A cryptographic primitive reported failure
    #[error("Crypto operation {operation} failed: {reason}")]
    CryptoOperationFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

impl CryptoError {
    pub(crate) fn decode(field: &str, reason: impl ToString) -> Self {
        CryptoError::DecodeFailure {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn key_unavailable(key_type: &str, reason: impl ToString) -> Self {
        CryptoError::KeyMaterialUnavailable {
            key_type: key_type.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn operation(operation: &str, reason: impl ToString) -> Self {
        CryptoError::CryptoOperationFailed {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Uniform failure for anything that decrypts or authenticates secret data
    pub(crate) fn authentication(operation: &str) -> Self {
        Self::operation(operation, AUTHENTICATION_FAILED)
    }
}

impl From<bs58::decode::Error> for CryptoError {
    fn from(err: bs58::decode::Error) -> Self {
        CryptoError::decode("base58check", format!("base58 decode error: {}", err))
    }
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::decode("armor", format!("base64 decode error: {}", err))
    }
}

// Conversion from k256 errors (elliptic curve operations)
impl From<k256::elliptic_curve::Error> for CryptoError {
    fn from(err: k256::elliptic_curve::Error) -> Self {
        CryptoError::key_unavailable("unknown", format!("k256 error: {}", err))
    }
}
