// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT token management and validation
//!
//! This submodule handles RS256 key loading, token signing and token
//! verification. Tokens are self-describing: nothing is stored server side.

mod claims;
mod keys;
mod signer;
mod verifier;

// Re-export public API
pub use claims::ClaimSet;
pub use keys::{JwkKeySet, KeyMaterial};
pub use signer::TokenSigner;
pub use verifier::TokenVerifier;
