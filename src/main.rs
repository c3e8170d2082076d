// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the security service
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use security_service::auth::{InMemoryUserDirectory, TokenIssuanceService};
use security_service::config::{self, Config};
use security_service::server::{build_rocket, figment_from_config};

/// RS256 token issuance and verification service
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Web server port, overrides the configuration
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Web server address, overrides the configuration
    #[arg(short = 'a', long)]
    address: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            anyhow::bail!(
                "Configuration file does not exist: {}",
                validate_path.display()
            );
        }
        let config = Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        TokenIssuanceService::from_config(
            &config,
            Arc::new(InMemoryUserDirectory::from_access_config(&config.access)),
        )
        .context("Configured key pair is unusable")?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let mut config = Config::from_file(&args.config)?;
    config.apply_args(args.port, args.address);

    // Key loading failures stop the process before anything is served
    let directory = Arc::new(InMemoryUserDirectory::from_access_config(&config.access));
    let service = TokenIssuanceService::from_config(&config, directory)
        .context("Failed to initialise the token engine")?;

    info!(
        "Starting security service on {}:{} with {} configured users",
        config.server.address,
        config.server.port,
        config.access.users.len()
    );

    build_rocket(figment_from_config(&config), Arc::new(service))?
        .launch()
        .await
        .context("Rocket server failed")?;
    Ok(())
}
