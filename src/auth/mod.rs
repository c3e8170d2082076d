// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Token engine
//!
//! This module issues and validates RS256 access and refresh tokens and
//! enforces scope-based authorization.
//!
//! ## Components
//!
//! - [`CredentialAuthenticator`]: username/password to [`Identity`]
//! - [`jwt`]: key material, [`TokenSigner`] and [`TokenVerifier`]
//! - [`TokenIssuanceService`]: the `password` and `refreshToken` grants
//! - [`ScopeGate`]: exact-match scope check
//! - [`guards`]: Rocket request guards built on the above
//!
//! The user store is reached only through [`UserDirectory`].

pub mod authenticator;
pub mod directory;
pub mod error;
pub mod guards;
pub mod identity;
pub mod issuance;
pub mod jwt;
pub mod password;
pub mod scope;

// Re-export commonly used types
pub use authenticator::CredentialAuthenticator;
pub use directory::{DirectoryEntry, InMemoryUserDirectory, UserDirectory};
pub use error::{AuthError, AuthResult};
pub use guards::{AdminScope, Authenticated, RequireScope, ScopeRequirement, UserScope};
pub use identity::Identity;
pub use issuance::{GrantRequest, TokenIssuanceService, TokenResponse};
pub use jwt::{ClaimSet, JwkKeySet, KeyMaterial, TokenSigner, TokenVerifier};
pub use password::{PasswordVerifier, UnixCryptVerifier};
pub use scope::ScopeGate;
