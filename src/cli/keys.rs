// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use zeroize::Zeroizing;

use super::{decode_hex, read_key};
use crate::crypto::{HashType, PasswordData, PrivateScalar, Secp256k1Engine};

/// Arguments for encode-key command
#[derive(Args, Debug)]
pub struct EncodeKeyArgs {
    /// Private scalar as 32-byte hex (can also be set via KEYSEAL_PRIVATE_SCALAR env var)
    #[arg(long, env = "KEYSEAL_PRIVATE_SCALAR", hide_env_values = true)]
    pub scalar: String,

    /// Encrypt with the ephemeral passphrase instead of the master passphrase
    #[arg(long)]
    pub ephemeral: bool,
}

/// Arguments for sign command
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Key file (JSON key handle with a private half)
    #[arg(long)]
    pub key: PathBuf,

    /// Contract file to sign
    #[arg(long)]
    pub contract: PathBuf,

    /// Digest algorithm (defaults to the configured one)
    #[arg(long)]
    pub digest: Option<HashType>,

    /// Key was encoded in ephemeral mode
    #[arg(long)]
    pub ephemeral: bool,
}

/// Arguments for verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Key file (JSON key handle with a public half)
    #[arg(long)]
    pub key: PathBuf,

    /// Contract file that was signed
    #[arg(long)]
    pub contract: PathBuf,

    /// Signature as hex
    #[arg(long)]
    pub signature: String,

    /// Digest algorithm (defaults to the configured one)
    #[arg(long)]
    pub digest: Option<HashType>,
}

pub fn encode_key(engine: &Secp256k1Engine, args: EncodeKeyArgs) -> Result<()> {
    let raw = Zeroizing::new(decode_hex(&args.scalar)?);
    let scalar = PrivateScalar::from_slice(&raw)?;

    let handle = engine
        .codec()
        .key_handle(&scalar, &PasswordData::new("encode private key"), args.ephemeral)?;

    println!("{}", serde_json::to_string_pretty(&handle)?);
    Ok(())
}

pub fn sign(engine: &Secp256k1Engine, args: SignArgs) -> Result<()> {
    let key = read_key(&args.key)?;
    let contract = std::fs::read(&args.contract)
        .with_context(|| format!("Failed to read contract {}", args.contract.display()))?;
    let digest = args.digest.unwrap_or(engine.config().default_digest);

    let signature = engine.signatures().sign(
        &contract,
        &key,
        digest,
        &PasswordData::new("sign contract"),
        args.ephemeral,
    )?;

    info!("Signed {} ({} bytes, {})", args.contract.display(), contract.len(), digest);
    println!("{}", signature.to_hex());
    Ok(())
}

pub fn verify(engine: &Secp256k1Engine, args: VerifyArgs) -> Result<()> {
    let key = read_key(&args.key)?;
    let contract = std::fs::read(&args.contract)
        .with_context(|| format!("Failed to read contract {}", args.contract.display()))?;
    let signature = decode_hex(&args.signature)?;
    let digest = args.digest.unwrap_or(engine.config().default_digest);

    if engine
        .signatures()
        .verify(&contract, &key, &signature, digest)
    {
        println!("✅ Signature valid");
        Ok(())
    } else {
        Err(anyhow!("signature does not verify"))
    }
}
