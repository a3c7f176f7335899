// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text Encodings
//!
//! - **Base58Check**: keys, nonces and tags (bs58 with a 4-byte double-SHA-256 checksum)
//! - **Armor**: envelope ciphertext, zlib-deflated then base64 with 64-column lines

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::{rngs::OsRng, RngCore};

use super::error::{CryptoError, CryptoResult};

/// Largest payload `dearmor` will inflate
pub const MAX_ARMORED_PAYLOAD: usize = 1024 * 1024;

const ARMOR_LINE_WIDTH: usize = 64;

pub fn base58check_encode(data: &[u8]) -> String {
    bs58::encode(data).with_check().into_string()
}

/// Fails with `DecodeFailure` on a bad alphabet or checksum
pub fn base58check_decode(encoded: &str) -> CryptoResult<Vec<u8>> {
    Ok(bs58::decode(encoded.trim()).with_check(None).into_vec()?)
}

/// Longest Base58Check text that `raw_len` bytes can encode to.
///
/// One base58 digit carries log2(58) ≈ 5.86 bits, so each byte (payload or
/// 4-byte checksum) costs at most 1.38 characters.
pub fn max_base58check_len(raw_len: usize) -> usize {
    (raw_len + 4) * 138 / 100 + 1
}

pub fn armor(data: &[u8]) -> CryptoResult<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CryptoError::operation("armor", e))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CryptoError::operation("armor", e))?;

    let encoded = STANDARD.encode(compressed);
    let lines: Vec<&str> = encoded
        .as_bytes()
        .chunks(ARMOR_LINE_WIDTH)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect();
    Ok(lines.join("\n"))
}

/// Inverse of [`armor`]. Whitespace and line breaks are ignored.
pub fn dearmor(text: &str) -> CryptoResult<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(CryptoError::decode("armor", "empty armored payload"));
    }
    let compressed = STANDARD.decode(cleaned)?;

    let mut inflated = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(MAX_ARMORED_PAYLOAD as u64 + 1)
        .read_to_end(&mut inflated)
        .map_err(|e| CryptoError::decode("armor", format!("inflate error: {}", e)))?;

    if inflated.len() > MAX_ARMORED_PAYLOAD {
        return Err(CryptoError::decode(
            "armor",
            format!("payload exceeds {} bytes", MAX_ARMORED_PAYLOAD),
        ));
    }
    Ok(inflated)
}

/// Random nonce, kept both raw and Base58Check-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
    pub raw: Vec<u8>,
    pub encoded: String,
}

impl Nonce {
    pub fn generate(size: usize) -> Self {
        let mut raw = vec![0u8; size];
        OsRng.fill_bytes(&mut raw);
        let encoded = base58check_encode(&raw);
        Self { raw, encoded }
    }
}
