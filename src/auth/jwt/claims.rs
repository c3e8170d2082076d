// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT claim set carried by access and refresh tokens

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::identity::split_scope;

/// Registered claims plus the `scope` claim
///
/// Access and refresh tokens share this exact shape; they differ only by
/// lifetime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    /// Subject, the username
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at, seconds since the Unix epoch
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch
    pub exp: i64,

    /// Space-delimited sorted authority names
    pub scope: String,
}

impl ClaimSet {
    /// Build a claim set valid from `issued_at` for `ttl`
    ///
    /// Fails with [`AuthError::SigningFailed`] when the expiry falls outside
    /// the representable time range.
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        scope: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<Self> {
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::SigningFailed(format!("token lifetime of {}s is out of range", ttl.num_seconds()))
        })?;
        Ok(Self {
            sub: subject.into(),
            iss: issuer.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            scope: scope.into(),
        })
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Lifetime the token was minted with
    pub fn ttl(&self) -> Duration {
        Duration::try_seconds(self.exp.saturating_sub(self.iat)).unwrap_or(Duration::MAX)
    }

    /// The `scope` claim as a set
    pub fn scopes(&self) -> BTreeSet<String> {
        split_scope(&self.scope)
    }
}
