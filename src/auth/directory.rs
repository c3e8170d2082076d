// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! User directory
//!
//! The token engine only needs one question answered: "who is this user and
//! what are they allowed to do right now?". [`UserDirectory`] is that seam,
//! so a file, database or LDAP backed store can be plugged in without
//! touching the engine. [`InMemoryUserDirectory`] is the store seeded from
//! the `access` section of the configuration.

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::identity::Identity;
use crate::config::{AccessConfig, User};

/// A user as stored in a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    identity: Identity,
    password_hash: String,
}

impl DirectoryEntry {
    pub fn new(identity: Identity, password_hash: impl Into<String>) -> Self {
        Self {
            identity,
            password_hash: password_hash.into(),
        }
    }

    /// Subject and current authorities
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn into_identity(self) -> Identity {
        self.identity
    }

    /// Stored hash, in whatever format the configured
    /// [`PasswordVerifier`](super::password::PasswordVerifier) understands
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl From<&User> for DirectoryEntry {
    fn from(user: &User) -> Self {
        DirectoryEntry::new(
            Identity::new(user.user.clone(), &user.permissions),
            user.pass.clone(),
        )
    }
}

/// Lookup of users by name
///
/// Implementations are shared across concurrent requests and are responsible
/// for their own synchronization.
pub trait UserDirectory: Send + Sync {
    /// Find a user by its exact username, `None` when absent
    fn find_by_username(&self, username: &str) -> Option<DirectoryEntry>;
}

impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    fn find_by_username(&self, username: &str) -> Option<DirectoryEntry> {
        (**self).find_by_username(username)
    }
}

/// Read-mostly in-memory directory
///
/// Lookups take a shared read lock; [`upsert`](Self::upsert) and
/// [`remove`](Self::remove) take the write lock. A poisoned lock is
/// recovered rather than propagated since entries are replaced whole.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, DirectoryEntry>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from the `access` configuration section
    pub fn from_access_config(access: &AccessConfig) -> Self {
        let directory = Self::new();
        for user in &access.users {
            directory.upsert(DirectoryEntry::from(user));
        }
        debug!("In-memory directory loaded with {} users", access.users.len());
        directory
    }

    /// Insert or replace a user
    pub fn upsert(&self, entry: DirectoryEntry) {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(entry.identity().subject.clone(), entry);
    }

    /// Replace the authorities of an existing user, returns `false` if unknown
    pub fn set_authorities<I, S>(&self, username: &str, authorities: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        match users.get_mut(username) {
            Some(entry) => {
                entry.identity = Identity::new(username, authorities);
                true
            }
            None => false,
        }
    }

    /// Remove a user, returns the removed entry
    pub fn remove(&self, username: &str) -> Option<DirectoryEntry> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.remove(username)
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_username(&self, username: &str) -> Option<DirectoryEntry> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.get(username).cloned()
    }
}
