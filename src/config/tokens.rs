// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Token lifetime and claim configuration
//!
//! The defaults reproduce the issuance policy clients rely on: a caller that
//! does not ask for a refresh token gets a 5 minute access token, a caller
//! that does gets a 1 minute access token plus a 5 minute refresh token.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Issuer written to, and expected in, the `iss` claim
pub const DEFAULT_ISSUER: &str = "security-service";

/// Upper bound for every lifetime and for the leeway, one year in seconds
pub const MAX_TOKEN_TTL: i64 = 31_536_000;

/// Claim and lifetime settings, all durations in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensConfig {
    /// Value of the `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Access token lifetime when no refresh token is issued.
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: i64,

    /// Access token lifetime when a refresh token is issued alongside it.
    #[serde(default = "default_access_token_ttl_with_refresh")]
    pub access_token_ttl_with_refresh: i64,

    /// Refresh token lifetime.
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: i64,

    /// Clock skew tolerated on `exp` during verification. Zero means strict.
    #[serde(default)]
    pub leeway: u64,
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_access_token_ttl() -> i64 {
    300
}

fn default_access_token_ttl_with_refresh() -> i64 {
    60
}

fn default_refresh_token_ttl() -> i64 {
    300
}

/// Seconds to a duration, saturating instead of panicking
fn lifetime(seconds: i64) -> Duration {
    Duration::try_seconds(seconds).unwrap_or(Duration::MAX)
}

impl TokensConfig {
    pub fn access_ttl(&self, with_refresh_token: bool) -> Duration {
        if with_refresh_token {
            lifetime(self.access_token_ttl_with_refresh)
        } else {
            lifetime(self.access_token_ttl)
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        lifetime(self.refresh_token_ttl)
    }
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            access_token_ttl: default_access_token_ttl(),
            access_token_ttl_with_refresh: default_access_token_ttl_with_refresh(),
            refresh_token_ttl: default_refresh_token_ttl(),
            leeway: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetimes() {
        let tokens = TokensConfig::default();
        assert_eq!(tokens.access_ttl(false), Duration::minutes(5));
        assert_eq!(tokens.access_ttl(true), Duration::minutes(1));
        assert_eq!(tokens.refresh_ttl(), Duration::minutes(5));
        assert_eq!(tokens.leeway, 0);
        assert_eq!(tokens.issuer, "security-service");
    }
}
