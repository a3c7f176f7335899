// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod version;

// Re-export main types
pub use config::EngineConfig;
pub use crypto::{
    CryptoError, CryptoResult, KeyHandle, PasswordData, Secp256k1Engine, SecretBytes, Signature,
    SymmetricEnvelope,
};
