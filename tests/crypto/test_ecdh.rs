// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH shared secret agreement

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use keyseal::crypto::{CryptoError, PrivateScalar, SHARED_SECRET_SIZE};
use sha2::{Digest, Sha256};

use super::common::{engine, new_key, password};

#[test]
fn test_shared_secret_is_symmetric() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);

    let ab = engine
        .shared_secret(&alice, &bob.to_public(), &password(), true)
        .unwrap();
    let ba = engine
        .shared_secret(&bob, &alice.to_public(), &password(), true)
        .unwrap();

    assert_eq!(ab.len(), SHARED_SECRET_SIZE);
    assert_eq!(ab, ba);
}

#[test]
fn test_shared_secret_depends_on_peer() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let bob = new_key(&engine, true);
    let carol = new_key(&engine, true);

    let with_bob = engine.shared_secret(&alice, &bob, &password(), true).unwrap();
    let with_carol = engine
        .shared_secret(&alice, &carol, &password(), true)
        .unwrap();
    assert_ne!(with_bob, with_carol);
}

#[test]
fn test_shared_secret_is_hashed_compressed_point() {
    let engine = engine();
    let alice_secret = SecretKey::random(&mut rand::rngs::OsRng);
    let alice_scalar = PrivateScalar::from_slice(&alice_secret.to_bytes()).unwrap();
    let alice = engine
        .codec()
        .key_handle(&alice_scalar, &password(), true)
        .unwrap();
    let bob = new_key(&engine, true);

    let bob_point = engine.codec().public_point(&bob).unwrap();
    let product = (bob_point.to_projective() * *alice_secret.to_nonzero_scalar()).to_affine();
    let expected = Sha256::digest(product.to_encoded_point(true).as_bytes());

    let secret = engine.shared_secret(&alice, &bob, &password(), true).unwrap();
    assert_eq!(secret.as_bytes(), expected.as_slice());
}

#[test]
fn test_mixed_passphrase_modes() {
    let engine = engine();
    let alice = new_key(&engine, false);
    let bob = new_key(&engine, true);

    let ab = engine.shared_secret(&alice, &bob, &password(), false).unwrap();
    let ba = engine.shared_secret(&bob, &alice, &password(), true).unwrap();
    assert_eq!(ab, ba);
}

#[test]
fn test_missing_halves_are_key_unavailable() {
    let engine = engine();
    let alice = new_key(&engine, true);
    let mut bob = new_key(&engine, true);
    bob.public = None;

    let err = engine
        .shared_secret(&alice.to_public(), &alice, &password(), true)
        .unwrap_err();
    assert!(matches!(err, CryptoError::KeyMaterialUnavailable { .. }));

    let err = engine.shared_secret(&alice, &bob, &password(), true).unwrap_err();
    assert!(matches!(err, CryptoError::KeyMaterialUnavailable { .. }));
}
