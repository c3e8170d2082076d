// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Endpoint authorization
//!
//! Scopes are flat: `ADMIN` does not imply `USER`. A token reaches an
//! endpoint only if the endpoint's required scope is literally present in
//! its `scope` claim.

use log::info;
use std::collections::BTreeSet;

use super::error::{AuthError, AuthResult};

/// Exact-match scope check
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeGate;

impl ScopeGate {
    /// Allow when `required` is one of `granted`
    pub fn authorize(granted: &BTreeSet<String>, required: &str) -> AuthResult<()> {
        if granted.contains(required) {
            Ok(())
        } else {
            info!("Scope '{}' not in {:?}", required, granted);
            Err(AuthError::InsufficientScope(required.to_string()))
        }
    }
}
