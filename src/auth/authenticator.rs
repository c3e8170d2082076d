// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Credential authentication
//!
//! Resolves a username/password presentation into an [`Identity`].

use log::debug;
use std::sync::Arc;

use super::directory::UserDirectory;
use super::error::{AuthError, AuthResult};
use super::identity::Identity;
use super::password::PasswordVerifier;

/// Hash checked when the username is unknown, so a miss costs the same as a
/// wrong password. Base64 of a `$5$` hash of a random string.
const DECOY_HASH: &str =
    "JDUkWHY4blEyY0x3NlJ5JGF2ZG1BT2pOSU52djBDN0wwd0NVMlJYVWhhWXNveE9EZVI3dURRempnRy4=";

/// Verifies a username/password pair against a [`UserDirectory`]
#[derive(Clone)]
pub struct CredentialAuthenticator {
    directory: Arc<dyn UserDirectory>,
    passwords: Arc<dyn PasswordVerifier>,
}

impl CredentialAuthenticator {
    pub fn new(directory: Arc<dyn UserDirectory>, passwords: Arc<dyn PasswordVerifier>) -> Self {
        Self {
            directory,
            passwords,
        }
    }

    /// Authenticate a credential presentation
    ///
    /// Returns the stored identity verbatim on success. Unknown users and
    /// wrong passwords both fail with [`AuthError::InvalidCredentials`].
    pub fn authenticate(&self, username: &str, password: &str) -> AuthResult<Identity> {
        match self.directory.find_by_username(username) {
            Some(entry) => {
                if self.passwords.matches(password, entry.password_hash()) {
                    debug!("Credentials accepted for user: {}", username);
                    Ok(entry.into_identity())
                } else {
                    debug!("Password mismatch for user: {}", username);
                    Err(AuthError::InvalidCredentials)
                }
            }
            None => {
                let _ = self.passwords.matches(password, DECOY_HASH);
                debug!("Unknown user: {}", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
