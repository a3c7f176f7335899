// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use zeroize::Zeroizing;

use super::{decode_hex, read_key};
use crate::crypto::{
    HashType, PasswordData, Secp256k1Engine, SecretBytes, SymmetricEnvelope, SymmetricMode,
};

/// Arguments for shared-secret command
#[derive(Args, Debug)]
pub struct SharedSecretArgs {
    /// Own key file (private half required)
    #[arg(long)]
    pub own: PathBuf,

    /// Peer key file (public half required)
    #[arg(long)]
    pub peer: PathBuf,

    /// Own key was encoded in ephemeral mode
    #[arg(long)]
    pub ephemeral: bool,
}

/// Arguments for seal command
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Sender key file (private half required)
    #[arg(long)]
    pub own: PathBuf,

    /// Recipient key file (public half required)
    #[arg(long)]
    pub peer: PathBuf,

    /// Session key as hex (can also be set via KEYSEAL_SESSION_KEY env var)
    #[arg(long, env = "KEYSEAL_SESSION_KEY", hide_env_values = true)]
    pub session_key: String,

    /// Cipher (defaults to the configured one)
    #[arg(long)]
    pub cipher: Option<SymmetricMode>,

    /// HMAC digest (defaults to the configured one)
    #[arg(long)]
    pub hmac: Option<HashType>,

    /// Sender key was encoded in ephemeral mode
    #[arg(long)]
    pub ephemeral: bool,

    /// Write the envelope here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for open command
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Envelope file (JSON)
    #[arg(long)]
    pub envelope: PathBuf,

    /// Recipient key file (private half required)
    #[arg(long)]
    pub own: PathBuf,

    /// Sender key file (public half required)
    #[arg(long)]
    pub peer: PathBuf,

    /// Recipient key was encoded in ephemeral mode
    #[arg(long)]
    pub ephemeral: bool,
}

pub fn shared_secret(engine: &Secp256k1Engine, args: SharedSecretArgs) -> Result<()> {
    let own = read_key(&args.own)?;
    let peer = read_key(&args.peer)?;

    let secret = engine.shared_secret(
        &own,
        &peer,
        &PasswordData::new("derive shared secret"),
        args.ephemeral,
    )?;

    println!("{}", hex::encode(secret.as_bytes()));
    Ok(())
}

pub fn seal(engine: &Secp256k1Engine, args: SealArgs) -> Result<()> {
    let own = read_key(&args.own)?;
    let peer = read_key(&args.peer)?;
    let session_key = SecretBytes::new(decode_hex(&args.session_key)?);

    let template = SymmetricEnvelope::template(
        args.cipher.unwrap_or(engine.config().default_cipher),
        args.hmac.unwrap_or(engine.config().default_hmac),
    );

    let envelope = engine.envelopes().seal(
        &session_key,
        &own,
        &peer,
        &PasswordData::new("seal session key"),
        args.ephemeral,
        &template,
    )?;

    let json = serde_json::to_string_pretty(&envelope)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write envelope {}", path.display()))?;
            info!("🔒 Envelope written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn open(engine: &Secp256k1Engine, args: OpenArgs) -> Result<()> {
    let own = read_key(&args.own)?;
    let peer = read_key(&args.peer)?;
    let content = std::fs::read_to_string(&args.envelope)
        .with_context(|| format!("Failed to read envelope {}", args.envelope.display()))?;
    let envelope: SymmetricEnvelope = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid envelope", args.envelope.display()))?;

    let session_key = engine.open(
        &envelope,
        &own,
        &peer,
        &PasswordData::new("open session key"),
        args.ephemeral,
    )?;

    let encoded = Zeroizing::new(hex::encode(session_key.as_bytes()));
    println!("{}", encoded.as_str());
    Ok(())
}
