// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Authentication and authorization errors
//!
//! Every variant is client-facing: the `Display` text is what ends up in the
//! `errorMessage` field of the HTTP response. None of them is transient, a
//! caller has to come back with different input.

use rocket::http::Status;
use thiserror::Error;

/// Result alias used by the token engine
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors raised while issuing, verifying or authorizing tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown username or wrong password (deliberately indistinguishable)
    #[error("Bad credentials")]
    InvalidCredentials,

    /// `refreshToken` grant without a refresh token
    #[error("The refresh token is required")]
    MissingRefreshToken,

    /// `grantType` is neither `password` nor `refreshToken`
    #[error("Unsupported grant type: '{0}'")]
    UnsupportedGrantType(String),

    /// The token could not be parsed as a compact JWS with the expected claims
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token parsed but its signature (or issuer/algorithm) does not check out
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token signature is valid but `exp` is in the past
    #[error("Token expired at {0}")]
    ExpiredToken(String),

    /// A refresh token names a subject the directory no longer knows
    #[error("Unknown subject: '{0}'")]
    UnknownSubject(String),

    /// The token is valid but lacks the scope required by the endpoint
    #[error("Insufficient scope: '{0}' is required")]
    InsufficientScope(String),

    /// A protected request came in without an `Authorization: Bearer` header
    #[error("Missing bearer token")]
    MissingBearerToken,

    /// The private key refused to sign. Key material is self-tested at load,
    /// so this points at a broken deployment rather than a bad request.
    #[error("Token signing failed: {0}")]
    SigningFailed(String),
}

impl AuthError {
    /// HTTP status used when this error reaches the transport layer
    ///
    /// Everything is `401 Unauthorized` except a scope denial, which is
    /// `403 Forbidden` since the caller is authenticated, and a signing
    /// failure, which is the server's fault.
    pub fn status(&self) -> Status {
        match self {
            AuthError::InsufficientScope(_) => Status::Forbidden,
            AuthError::SigningFailed(_) => Status::InternalServerError,
            _ => Status::Unauthorized,
        }
    }

    /// Short machine-friendly name, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingRefreshToken => "missing_refresh_token",
            AuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::ExpiredToken(_) => "expired_token",
            AuthError::UnknownSubject(_) => "unknown_subject",
            AuthError::InsufficientScope(_) => "insufficient_scope",
            AuthError::MissingBearerToken => "missing_bearer_token",
            AuthError::SigningFailed(_) => "signing_failed",
        }
    }
}
