// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::prelude::*;
use clap::Parser;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use security_service::auth::KeyMaterial;

/// Generate an RS256 key pair for the security service
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Output path for the public key PEM file
    #[clap(long, default_value = "./pub.key")]
    out_pub_key: PathBuf,

    /// Output path for the private key PEM file
    #[clap(long, default_value = "./private.key")]
    out_private_key: PathBuf,

    /// RSA key length in bits
    #[clap(long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(2048..=16384))]
    length: u32,

    /// Write PKCS#1 (`RSA PRIVATE KEY` / `RSA PUBLIC KEY`) instead of PKCS#8 / SPKI
    #[clap(long)]
    pkcs1: bool,

    /// Print a ready to paste `keys:` section for config.yaml
    #[clap(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Generating RSA key pair with {} bits...", args.length);

    let mut rng = rsa::rand_core::OsRng;

    let private_key = RsaPrivateKey::new(&mut rng, args.length as usize)
        .context("Failed to generate RSA private key")?;
    let public_key = RsaPublicKey::from(&private_key);

    let (private_pem, public_pem) = if args.pkcs1 {
        (
            private_key
                .to_pkcs1_pem(LineEnding::LF)
                .context("Failed to encode private key to PKCS#1 PEM")?
                .to_string(),
            public_key
                .to_pkcs1_pem(LineEnding::LF)
                .context("Failed to encode public key to PKCS#1 PEM")?,
        )
    } else {
        (
            private_key
                .to_pkcs8_pem(LineEnding::LF)
                .context("Failed to encode private key to PKCS#8 PEM")?
                .to_string(),
            public_key
                .to_public_key_pem(LineEnding::LF)
                .context("Failed to encode public key to SPKI PEM")?,
        )
    };

    // Same checks as at service startup
    let keys = KeyMaterial::from_pem(private_pem.as_bytes(), public_pem.as_bytes())
        .context("Generated key pair failed validation")?;

    let mut private_file = File::create(&args.out_private_key).with_context(|| {
        format!(
            "Failed to create private key file at {:?}",
            args.out_private_key
        )
    })?;
    private_file
        .write_all(private_pem.as_bytes())
        .context("Failed to write private key to file")?;

    let mut public_file = File::create(&args.out_pub_key)
        .with_context(|| format!("Failed to create public key file at {:?}", args.out_pub_key))?;
    public_file
        .write_all(public_pem.as_bytes())
        .context("Failed to write public key to file")?;

    println!("Private key written to: {:?}", args.out_private_key);
    println!("Public key written to: {:?}", args.out_pub_key);
    println!("Key id (kid): {}", keys.key_id());
    println!();

    if args.print_config {
        println!("keys:");
        println!(
            "  rs256_private_key: {}",
            BASE64_STANDARD.encode(private_pem.as_bytes())
        );
        println!(
            "  rs256_public_key: {}",
            BASE64_STANDARD.encode(public_pem.as_bytes())
        );
    } else {
        println!("To use them in the config.yaml, Base64 encode them with:");
        println!("base64 -w0 {}", args.out_private_key.display());
        println!("base64 -w0 {}", args.out_pub_key.display());
    }

    Ok(())
}
