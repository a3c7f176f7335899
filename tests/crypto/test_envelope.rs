// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session-key envelopes: round-trip, tamper detection, algorithm guard

use std::collections::HashSet;
use std::sync::Arc;

use keyseal::config::EngineConfig;
use keyseal::crypto::{
    armor, base58check_decode, base58check_encode, dearmor, AeadOutput, CryptoError,
    CryptoProvider, CryptoResult, HashType, RustCryptoProvider, Secp256k1Engine, SecretBytes,
    SymmetricEnvelope, SymmetricMode, AUTHENTICATION_FAILED,
};

use super::common::{
    engine, engine_with_master, new_key, password, CountingMasterKey, MASTER_PASSPHRASE,
};

const ALL_MODES: [SymmetricMode; 3] = [
    SymmetricMode::Aes256Gcm,
    SymmetricMode::ChaCha20Poly1305,
    SymmetricMode::XChaCha20Poly1305,
];

fn session_key() -> SecretBytes {
    SecretBytes::new((0u8..32).collect())
}

fn assert_authentication_failure(result: CryptoResult<SecretBytes>) {
    match result {
        Err(CryptoError::CryptoOperationFailed { reason, .. }) => {
            assert_eq!(reason, AUTHENTICATION_FAILED)
        }
        other => panic!("expected authentication failure, got {:?}", other),
    }
}

#[test]
fn test_roundtrip_all_algorithms() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);

    for mode in ALL_MODES {
        for hmac in [HashType::Sha256, HashType::Sha512] {
            let template = SymmetricEnvelope::template(mode, hmac);
            let envelope = engine
                .envelopes()
                .seal(&session_key(), &alice, &bob.to_public(), &password(), true, &template)
                .unwrap();

            assert!(envelope.is_complete());
            assert_eq!(envelope.cipher_algorithm, mode.as_str());
            assert_eq!(envelope.hmac_algorithm, hmac.as_str());
            assert_eq!(
                base58check_decode(&envelope.nonce).unwrap().len(),
                mode.key_size()
            );

            let opened = engine
                .open(&envelope, &bob, &alice.to_public(), &password(), true)
                .unwrap();
            assert_eq!(opened, session_key(), "{} / hmac-{}", mode, hmac);
        }
    }
}

#[test]
fn test_roundtrip_master_mode_and_json() {
    let engine = engine();
    let alice = new_key(&engine, false);
    let bob = new_key(&engine, false);

    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), false)
        .unwrap();
    let json = serde_json::to_string(&envelope).unwrap();
    let parsed: SymmetricEnvelope = serde_json::from_str(&json).unwrap();

    let opened = engine.open(&parsed, &bob, &alice, &password(), false).unwrap();
    assert_eq!(opened, session_key());
}

#[test]
fn test_nonces_are_unique() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);

    let mut nonces = HashSet::new();
    let mut ciphertexts = HashSet::new();
    for _ in 0..64 {
        let envelope = engine
            .seal(&session_key(), &alice, &bob, &password(), true)
            .unwrap();
        assert!(nonces.insert(envelope.nonce.clone()));
        assert!(ciphertexts.insert(envelope.ciphertext.clone()));
    }
}

#[test]
fn test_wrong_recipient_cannot_open() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let eve = new_key(&engine, true);

    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();
    assert_authentication_failure(engine.open(&envelope, &eve, &alice, &password(), true));
}

#[test]
fn test_ciphertext_bit_flip_detected() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();

    let raw = dearmor(&envelope.ciphertext).unwrap();
    for index in [0, raw.len() / 2, raw.len() - 1] {
        let mut flipped = raw.clone();
        flipped[index] ^= 0x80;
        let tampered = SymmetricEnvelope {
            ciphertext: armor(&flipped).unwrap(),
            ..envelope.clone()
        };
        assert_authentication_failure(engine.open(&tampered, &bob, &alice, &password(), true));
    }
}

#[test]
fn test_tag_bit_flip_detected() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();

    let mut tag = base58check_decode(&envelope.tag).unwrap();
    assert_eq!(tag.len(), 16);
    tag[5] ^= 0x01;
    let tampered = SymmetricEnvelope {
        tag: base58check_encode(&tag),
        ..envelope
    };
    assert_authentication_failure(engine.open(&tampered, &bob, &alice, &password(), true));
}

#[test]
fn test_nonce_bit_flip_detected() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();

    let mut nonce = base58check_decode(&envelope.nonce).unwrap();
    nonce[0] ^= 0x01;
    let tampered = SymmetricEnvelope {
        nonce: base58check_encode(&nonce),
        ..envelope
    };
    assert_authentication_failure(engine.open(&tampered, &bob, &alice, &password(), true));
}

#[test]
fn test_swapped_algorithm_name_detected() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();

    let tampered = SymmetricEnvelope {
        hmac_algorithm: "sha512".into(),
        ..envelope
    };
    assert_authentication_failure(engine.open(&tampered, &bob, &alice, &password(), true));
}

#[test]
fn test_missing_fields_are_decode_failures() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();

    let cases = [
        SymmetricEnvelope { nonce: String::new(), ..envelope.clone() },
        SymmetricEnvelope { tag: String::new(), ..envelope.clone() },
        SymmetricEnvelope { ciphertext: String::new(), ..envelope.clone() },
        SymmetricEnvelope { nonce: "not base58 0OIl".into(), ..envelope.clone() },
        SymmetricEnvelope { ciphertext: "!!!".into(), ..envelope.clone() },
    ];
    for case in cases {
        let err = engine
            .open(&case, &bob, &alice, &password(), true)
            .unwrap_err();
        assert!(matches!(err, CryptoError::DecodeFailure { .. }), "{:?}", err);
    }
}

#[test]
fn test_oversized_nonce_and_tag_rejected_before_decoding() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();

    let huge = base58check_encode(&vec![0xAB; 4_000]);
    for tampered in [
        SymmetricEnvelope { nonce: huge.clone(), ..envelope.clone() },
        SymmetricEnvelope { tag: huge.clone(), ..envelope.clone() },
    ] {
        match engine.open(&tampered, &bob, &alice, &password(), true) {
            Err(CryptoError::DecodeFailure { reason, .. }) => assert!(reason.contains("exceeds")),
            other => panic!("expected decode failure, got {:?}", other),
        }
    }
}

#[test]
fn test_nonce_must_match_cipher_key_size() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let envelope = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap();
    let nonce = base58check_decode(&envelope.nonce).unwrap();

    for wrong in [nonce[..24].to_vec(), nonce[..31].to_vec(), Vec::new()] {
        let tampered = SymmetricEnvelope {
            nonce: base58check_encode(&wrong),
            ..envelope.clone()
        };
        let err = engine
            .open(&tampered, &bob, &alice, &password(), true)
            .unwrap_err();
        assert!(matches!(err, CryptoError::DecodeFailure { .. }), "{:?}", err);
    }
}

#[test]
fn test_empty_session_key_rejected() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);

    let err = engine
        .seal(&SecretBytes::default(), &alice, &bob, &password(), true)
        .unwrap_err();
    assert!(matches!(err, CryptoError::CryptoOperationFailed { .. }));
}

#[test]
fn test_unsupported_algorithms_rejected_before_key_lookup() {
    let master = Arc::new(CountingMasterKey::new(MASTER_PASSPHRASE));
    let engine = engine_with_master(master.clone());

    let alice = new_key(&engine, false);
    let bob = new_key(&engine, false);
    let calls_after_setup = master.calls();

    let bad_cipher = SymmetricEnvelope::template_named("rc4", "sha256");
    let err = engine
        .envelopes()
        .seal(&session_key(), &alice, &bob, &password(), false, &bad_cipher)
        .unwrap_err();
    assert_eq!(err, CryptoError::UnsupportedAlgorithm { name: "rc4".into() });

    let bad_hmac = SymmetricEnvelope::template_named("aes-256-gcm", "md5");
    let err = engine
        .envelopes()
        .seal(&session_key(), &alice, &bob, &password(), false, &bad_hmac)
        .unwrap_err();
    assert!(matches!(err, CryptoError::UnsupportedHashFunction { .. }));

    // blake3 is a digest, not an HMAC
    let blake3_hmac = SymmetricEnvelope::template_named("aes-256-gcm", "blake3");
    let err = engine
        .envelopes()
        .seal(&session_key(), &alice, &bob, &password(), false, &blake3_hmac)
        .unwrap_err();
    assert!(matches!(err, CryptoError::UnsupportedHashFunction { .. }));

    let sealed = engine
        .seal(&session_key(), &alice, &bob, &password(), false)
        .unwrap();
    let calls_after_seal = master.calls();
    let renamed = SymmetricEnvelope {
        cipher_algorithm: "des".into(),
        ..sealed
    };
    let err = engine
        .open(&renamed, &bob, &alice, &password(), false)
        .unwrap_err();
    assert!(matches!(err, CryptoError::UnsupportedAlgorithm { .. }));

    assert_eq!(calls_after_setup + 1, calls_after_seal);
    assert_eq!(master.calls(), calls_after_seal);
}

/// Provider that claims a cipher key larger than any HMAC output
struct OversizedKeyProvider(RustCryptoProvider);

impl CryptoProvider for OversizedKeyProvider {
    fn digest(&self, hash: HashType, data: &[u8]) -> CryptoResult<Vec<u8>> {
        self.0.digest(hash, data)
    }

    fn hmac_supported(&self, hash: HashType) -> bool {
        self.0.hmac_supported(hash)
    }

    fn hmac(&self, hash: HashType, key: &[u8], data: &[u8]) -> CryptoResult<SecretBytes> {
        self.0.hmac(hash, key, data)
    }

    fn key_size(&self, _mode: SymmetricMode) -> usize {
        48
    }

    fn aead_encrypt(
        &self,
        mode: SymmetricMode,
        key: &SecretBytes,
        iv: &[u8],
        plaintext: &[u8],
    ) -> CryptoResult<AeadOutput> {
        self.0.aead_encrypt(mode, key, iv, plaintext)
    }

    fn aead_decrypt(
        &self,
        mode: SymmetricMode,
        key: &SecretBytes,
        iv: &[u8],
        tag: &[u8],
        ciphertext: &[u8],
    ) -> CryptoResult<SecretBytes> {
        self.0.aead_decrypt(mode, key, iv, tag, ciphertext)
    }
}

#[test]
fn test_short_hmac_output_is_insufficient_entropy() {
    let engine = Secp256k1Engine::with_provider(
        EngineConfig::default(),
        Arc::new(OversizedKeyProvider(RustCryptoProvider::new())),
        Arc::new(CountingMasterKey::new(MASTER_PASSPHRASE)),
    )
    .unwrap();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);

    let err = engine
        .seal(&session_key(), &alice, &bob, &password(), true)
        .unwrap_err();
    assert_eq!(
        err,
        CryptoError::InsufficientEntropy {
            what: "key".into(),
            required: 48,
            available: 32,
        }
    );

    // sha512 covers the key, so the failure moves to the cipher itself
    let template = SymmetricEnvelope::template(SymmetricMode::Aes256Gcm, HashType::Sha512);
    let sealed = engine
        .envelopes()
        .seal(&session_key(), &alice, &bob, &password(), true, &template);
    assert!(matches!(sealed, Err(CryptoError::CryptoOperationFailed { .. })));
}
