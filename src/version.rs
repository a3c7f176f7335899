// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for keyseal

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-secp256k1-envelopes-2025-10-13";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-13";

/// Leading byte of every encoded signature
pub const SIGNATURE_WIRE_VERSION: u8 = crate::crypto::SIGNATURE_VERSION;

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "secp256k1-ecdsa",
    "low-s-signatures",
    "hedged-nonces",
    "ecdh-shared-secret",
    "aes-256-gcm",
    "chacha20-poly1305",
    "xchacha20-poly1305",
    "hmac-sha256",
    "hmac-sha512",
    "base58check-keys",
    "armored-ciphertext",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("keyseal {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "signature_wire_version": SIGNATURE_WIRE_VERSION,
        "features": FEATURES,
    })
}
