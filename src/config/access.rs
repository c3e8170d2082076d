// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! User access and permissions configuration
//!
//! This module defines the users known to the bundled in-memory directory,
//! with their password hashes and the authorities that end up in the
//! `scope` claim of their tokens.

use serde::{Deserialize, Serialize};

/// Base64 of `openssl passwd -5 -salt Qm3xT9aLp2Vz 1234`
const DEMO_HASH_USER1: &str =
    "JDUkUW0zeFQ5YUxwMlZ6JE1ieTZ3dzVqZ3pneFdMY1BpQm9TL2ZZcE5sVDdzakkzTVlxVzBQMDQ4c0E=";
/// Base64 of `openssl passwd -5 -salt Rk7wY2bNc4Hd 1234`
const DEMO_HASH_USER2: &str =
    "JDUkUms3d1kyYk5jNEhkJFd2T1RwR2lXR2dmLlFycEN1NWdpUDRINXdQMVk3dms2N0NkOS9uaEt6bi4=";
/// Base64 of `openssl passwd -5 -salt Tp5sE8fJd1Mq 1234`
const DEMO_HASH_USER3: &str =
    "JDUkVHA1c0U4ZkpkMU1xJFB3bHFCaVRCSmVMMU5tZHNEUDVING1NOGE3ZEViS2FWM0hCZGR5MmJmSjg=";

/// User definition for authentication and authorization
///
/// # Example
///
/// ```
/// use security_service::config::User;
///
/// let user = User {
///     user: "user1".to_string(),
///     pass: "JDUkUW0zeFQ5YUxwMlZ6JE1ieTZ3dzVqZ3pneFdMY1BpQm9TL2ZZcE5sVDdzakkzTVlxVzBQMDQ4c0E=".to_string(),
///     permissions: vec!["USER".to_string()],
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The username used for authentication, becomes the token subject
    pub user: String,

    /// Base64-encoded password hash
    ///
    /// This should be created using: `openssl passwd -5 <password> | base64 -w0`
    pub pass: String,

    /// Authorities granted to the user (`USER`, `ADMIN`, ...)
    pub permissions: Vec<String>,
}

impl User {
    pub fn new(user: impl Into<String>, pass: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Configuration for user access and permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// List of users with their credentials and permissions
    #[serde(default)]
    pub users: Vec<User>,
}

impl Default for AccessConfig {
    /// Demo users, all with password `1234` (change them in production)
    fn default() -> Self {
        Self {
            users: vec![
                User::new("user1", DEMO_HASH_USER1, &["USER"]),
                User::new("user2", DEMO_HASH_USER2, &["USER"]),
                User::new("user3", DEMO_HASH_USER3, &["USER", "ADMIN"]),
            ],
        }
    }
}
