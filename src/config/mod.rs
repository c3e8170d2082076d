// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the security service
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `server`: network binding of the HTTP server
//! - `keys`: the RS256 key pair, Base64-encoded PEM
//! - `tokens`: issuer and token lifetimes
//! - `access`: users, password hashes and authorities
//!
//! ## Usage
//!
//! ```no_run
//! use security_service::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(Some(8081), Some("0.0.0.0".to_string()));
//!
//! println!("Server port: {}", config.server.port);
//! ```

pub mod access;
pub mod keys;
pub mod server;
pub mod tokens;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use access::{AccessConfig, User};
pub use keys::KeysConfig;
pub use server::ServerConfig;
pub use tokens::{TokensConfig, DEFAULT_ISSUER};
pub use utils::{is_valid_ip_address, output_config_schema, validate_specific_rules};

/// Root configuration structure for the security service.
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, so an empty file yields a working development setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Network binding of the HTTP server.
    #[serde(default)]
    pub server: ServerConfig,

    /// RS256 key pair used to sign and verify tokens.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Issuer and lifetimes of issued tokens.
    #[serde(default)]
    pub tokens: TokensConfig,

    /// Users known to the in-memory directory.
    #[serde(default)]
    pub access: AccessConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Creating sample configuration file at {:?}", sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. An invalid
    /// file is rejected and a `.sample.yaml` file with defaults is written
    /// next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        Self::from_yaml_str(&contents).or_else(|err| {
            if let Err(e) = Self::create_sample_config(path) {
                error!("Failed to create sample config: {}", e);
            }
            Err(err.context(format!("Invalid configuration in {}", path.display())))
        })
    }

    /// Parse, schema-check and validate a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // An empty document is valid and means "all defaults"
        let yaml_value: serde_yml::Value = if contents.trim().is_empty() {
            serde_yml::Value::Mapping(Default::default())
        } else {
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?
        };

        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        let schema: serde_json::Value =
            serde_json::from_str(utils::CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating configuration against schema");
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = serde_json::from_value(json_value)
            .context("Failed to deserialize configuration")?;

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values explicitly provided override the loaded configuration.
    pub fn apply_args(&mut self, port: Option<u16>, address: Option<String>) {
        if let Some(port) = port {
            debug!("Overriding port from command line: {}", port);
            self.server.port = port;
        }

        if let Some(address) = address {
            debug!("Overriding address from command line: {}", address);
            self.server.address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = Config::from_yaml_str("server:\n  port: 9090\n").unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.address, "127.0.0.1");
        assert_eq!(config.tokens, TokensConfig::default());
        assert_eq!(config.access.users.len(), 3);
    }

    #[test]
    fn test_apply_args_overrides_only_given_values() {
        let mut config = Config::default();
        config.apply_args(Some(9443), None);
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.server.address, "127.0.0.1");
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = serde_yml::to_string(&Config::default()).unwrap();
        let config = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(config, Config::default());
    }
}
