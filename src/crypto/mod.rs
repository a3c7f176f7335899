// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! secp256k1 Cryptography Engine
//!
//! This module implements the asymmetric core used by the contract and
//! secure-channel layers:
//!
//! - **Key Codec**: encoded public/private key strings ↔ k256 types
//! - **Signature**: ECDSA over a digest of contract text, fixed 65-byte wire form
//! - **ECDH**: hashed secp256k1 shared secret between two parties
//! - **Envelope**: session key sealed with ECDH + nonce-rebound HMAC + AEAD
//! - **Context**: the engine's one-time-randomized curve context
//!
//! ## Security Considerations
//!
//! - Private scalars, derived keys and session keys live in zeroize-on-drop buffers
//! - Decryption and authentication failures are reported uniformly
//! - Verification is fail-closed: malformed input never verifies
//! - Secret material is never logged
//!
//! ## Seal Flow
//!
//! 1. Sender picks cipher + HMAC names (envelope template)
//! 2. Fresh nonce, sized to the cipher key
//! 3. ECDH(sender private, recipient public)
//! 4. HMAC(shared secret, nonce) → per-envelope key
//! 5. AEAD-encrypt the session key
//! 6. Recipient repeats 3–4 with (recipient private, sender public) and decrypts

pub mod context;
pub mod ecdh;
pub mod encoding;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod key_codec;
pub mod master_key;
pub mod provider;
pub mod secret;
pub mod signature;

pub use context::CurveContext;
pub use ecdh::{EcdhAgreement, SHARED_SECRET_SIZE};
pub use encoding::{
    armor, base58check_decode, base58check_encode, dearmor, max_base58check_len, Nonce,
};
pub use engine::Secp256k1Engine;
pub use envelope::{EnvelopeSealer, SymmetricEnvelope};
pub use error::{CryptoError, CryptoResult, AUTHENTICATION_FAILED};
pub use key_codec::{EncodedPrivateKey, EncodedPublicKey, KeyCodec, KeyHandle};
pub use master_key::{
    CachedMasterKey, EnvMasterKey, MasterKeySource, PasswordData, EPHEMERAL_PASSPHRASE,
};
pub use provider::{AeadOutput, CryptoProvider, HashType, RustCryptoProvider, SymmetricMode};
pub use secret::{PrivateScalar, SecretBytes, PRIVATE_KEY_SIZE};
pub use signature::{
    decode_signature, encode_signature, Signature, SignatureEngine, SIGNATURE_SIZE,
    SIGNATURE_VERSION,
};
