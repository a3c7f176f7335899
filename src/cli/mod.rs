// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod envelope;
pub mod keys;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::crypto::{EnvMasterKey, KeyHandle, Secp256k1Engine};

/// keyseal CLI
#[derive(Parser, Debug)]
#[command(name = "keyseal-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "secp256k1 contract signing and session-key envelopes", long_about = None)]
pub struct Cli {
    /// TOML config file with an [engine] table
    #[arg(long, global = true, env = "KEYSEAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a raw private scalar into a stored key pair (JSON)
    EncodeKey(keys::EncodeKeyArgs),

    /// Sign a contract file
    Sign(keys::SignArgs),

    /// Verify a contract signature
    Verify(keys::VerifyArgs),

    /// Print the ECDH shared secret between two keys
    SharedSecret(envelope::SharedSecretArgs),

    /// Seal a session key to a peer
    Seal(envelope::SealArgs),

    /// Open a sealed session key
    Open(envelope::OpenArgs),
}

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let engine = build_engine(cli.config.as_deref())?;

    match cli.command {
        Commands::EncodeKey(args) => keys::encode_key(&engine, args),
        Commands::Sign(args) => keys::sign(&engine, args),
        Commands::Verify(args) => keys::verify(&engine, args),
        Commands::SharedSecret(args) => envelope::shared_secret(&engine, args),
        Commands::Seal(args) => envelope::seal(&engine, args),
        Commands::Open(args) => envelope::open(&engine, args),
    }
}

fn build_engine(config_path: Option<&Path>) -> Result<Secp256k1Engine> {
    let config = match config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();

    let master_keys = Arc::new(EnvMasterKey::new(config.master_key_env.clone()));
    Secp256k1Engine::new(config, master_keys)
}

pub(crate) fn read_key(path: &Path) -> Result<KeyHandle> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Key file {} is not a valid key handle", path.display()))
}

/// Hex with or without a 0x prefix
pub(crate) fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(hex_str).context("value is not valid hex")
}
