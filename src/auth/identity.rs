// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Authenticated identity
//!
//! An [`Identity`] is what the credential check or the directory lookup
//! hands to the token signer: a subject and the set of authorities it holds.
//! It only lives for the duration of one request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Subject plus authority set
///
/// Authorities are kept in a `BTreeSet` so the scope string derived from
/// them is always sorted and free of duplicates, whatever order the
/// backing store returned them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user identifier, becomes the `sub` claim
    pub subject: String,
    /// Scope / role names granted to the subject
    pub authorities: BTreeSet<String>,
}

impl Identity {
    /// Build an identity from any iterable of authority names
    ///
    /// Blank entries are dropped and surrounding whitespace is trimmed, since
    /// the scope claim is whitespace-delimited and could not carry them.
    pub fn new<I, S>(subject: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            subject: subject.into(),
            authorities: authorities
                .into_iter()
                .map(|a| a.as_ref().trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// Space-joined sorted authority names, the value of the `scope` claim
    pub fn scope(&self) -> String {
        join_scope(&self.authorities)
    }
}

/// Join a set of scopes into the wire representation
pub fn join_scope(scopes: &BTreeSet<String>) -> String {
    scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Split a wire scope string back into a set
pub fn split_scope(scope: &str) -> BTreeSet<String> {
    scope.split_whitespace().map(String::from).collect()
}
