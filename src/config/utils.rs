// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use base64::Engine;
use log::{debug, warn};
use std::collections::HashSet;

use super::tokens::MAX_TOKEN_TTL;
use super::Config;

/// JSON schema the YAML configuration is validated against
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// ```bash
/// ./security_service --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Port Range**: the server port is within 1-65534
/// - **IP Address Format**: only warns, "localhost"-style values are accepted
/// - **Keys**: both RS256 keys are valid Base64 (their PEM content is checked when
///   the key material is loaded)
/// - **Tokens**: the issuer is not blank and every lifetime is strictly positive
/// - **Users**: usernames are unique and non-empty, password hashes are Base64-encoded
///   Unix crypt hashes as produced by `openssl passwd`, and permissions contain no
///   whitespace since they are space-joined into the `scope` claim
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.server.port < 1 || config.server.port > 65534 {
        anyhow::bail!("Invalid port number: {}", config.server.port);
    }

    if !is_valid_ip_address(&config.server.address) {
        warn!(
            "Potentially invalid address format: {}",
            config.server.address
        );
    }

    let _ = base64::engine::general_purpose::STANDARD
        .decode(config.keys.rs256_private_key.trim())
        .context("RS256 private key is not valid base64")?;
    let _ = base64::engine::general_purpose::STANDARD
        .decode(config.keys.rs256_public_key.trim())
        .context("RS256 public key is not valid base64")?;

    if config.tokens.issuer.trim().is_empty() {
        anyhow::bail!("Token issuer must not be empty");
    }
    for (name, ttl) in [
        ("access_token_ttl", config.tokens.access_token_ttl),
        (
            "access_token_ttl_with_refresh",
            config.tokens.access_token_ttl_with_refresh,
        ),
        ("refresh_token_ttl", config.tokens.refresh_token_ttl),
    ] {
        if ttl <= 0 {
            anyhow::bail!("Token lifetime {} must be positive, got {}", name, ttl);
        }
        if ttl > MAX_TOKEN_TTL {
            anyhow::bail!(
                "Token lifetime {} must not exceed {} seconds, got {}",
                name,
                MAX_TOKEN_TTL,
                ttl
            );
        }
    }
    if config.tokens.leeway > MAX_TOKEN_TTL as u64 {
        anyhow::bail!(
            "Token leeway must not exceed {} seconds, got {}",
            MAX_TOKEN_TTL,
            config.tokens.leeway
        );
    }

    let mut seen = HashSet::new();
    for user in &config.access.users {
        if user.user.trim().is_empty() {
            anyhow::bail!("User name must not be empty");
        }
        if !seen.insert(user.user.as_str()) {
            anyhow::bail!("Duplicate user: {}", user.user);
        }

        let decoded_pass = base64::engine::general_purpose::STANDARD
            .decode(user.pass.trim())
            .with_context(|| format!("Password of user {} is not valid base64", user.user))?;
        // $1$ md5, $5$ sha256, $6$ sha512, $2a$/$2b$/$2y$ bcrypt
        if !["$1$", "$5$", "$6$", "$2a$", "$2b$", "$2y$"]
            .iter()
            .any(|prefix| decoded_pass.starts_with(prefix.as_bytes()))
        {
            anyhow::bail!(
                "Password of user {} is not a valid hash, you should use openssl passwd -5 <password> | base64 -w0",
                user.user
            );
        }

        for permission in &user.permissions {
            if permission.is_empty() || permission.contains(char::is_whitespace) {
                anyhow::bail!(
                    "Permission '{}' of user {} must be a single non-empty word",
                    permission,
                    user.user
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::User;

    #[test]
    fn test_default_config_passes() {
        validate_specific_rules(&Config::default()).unwrap();
    }

    #[test]
    fn test_ip_addresses() {
        assert!(is_valid_ip_address("127.0.0.1"));
        assert!(is_valid_ip_address("::1"));
        assert!(is_valid_ip_address("localhost"));
        assert!(!is_valid_ip_address("not an address"));
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let mut config = Config::default();
        let first = config.access.users[0].clone();
        config.access.users.push(first);
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate user"));
    }

    #[test]
    fn test_plaintext_password_rejected() {
        let mut config = Config::default();
        config.access.users = vec![User::new(
            "alice",
            base64::engine::general_purpose::STANDARD.encode("1234"),
            &["USER"],
        )];
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_permission_with_space_rejected() {
        let mut config = Config::default();
        config.access.users[0].permissions = vec!["READ WRITE".to_string()];
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = Config::default();
        config.tokens.refresh_token_ttl = 0;
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("refresh_token_ttl"));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let mut config = Config::default();
        config.tokens.access_token_ttl = MAX_TOKEN_TTL + 1;
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("access_token_ttl"));

        let mut config = Config::default();
        config.tokens.leeway = u64::MAX;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.tokens.refresh_token_ttl = MAX_TOKEN_TTL;
        assert!(validate_specific_rules(&config).is_ok());
    }

    #[test]
    fn test_blank_issuer_rejected() {
        let mut config = Config::default();
        config.tokens.issuer = "  ".to_string();
        assert!(validate_specific_rules(&config).is_err());
    }
}
