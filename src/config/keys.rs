// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! RSA signing key configuration
//!
//! Both keys are stored as Base64-encoded PEM so they fit on one YAML line.
//! They can be generated with the `rs256keygen` binary or with openssl:
//!
//! ```bash
//! openssl genpkey -algorithm RSA -pkeyopt rsa_keygen_bits:2048 -out private.key
//! openssl rsa -in private.key -pubout -out pub.key
//! base64 -w0 private.key; base64 -w0 pub.key
//! ```

use base64::Engine;
use serde::{Deserialize, Serialize};

/// RS256 key pair, Base64-encoded PEM
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysConfig {
    /// RS256 private key (PKCS#1 or PKCS#8 PEM), Base64 encoded.
    #[serde(default = "default_rs256_private_key")]
    pub rs256_private_key: String,

    /// RS256 public key (PKCS#1 or SPKI PEM), Base64 encoded.
    #[serde(default = "default_rs256_public_key")]
    pub rs256_public_key: String,
}

impl std::fmt::Debug for KeysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysConfig")
            .field("rs256_private_key", &"<redacted>")
            .field("rs256_public_key", &self.rs256_public_key)
            .finish()
    }
}

/// Development private key bundled in `resources/private.key`
fn default_rs256_private_key() -> String {
    let key_str = include_str!("../../resources/private.key");
    base64::engine::general_purpose::STANDARD.encode(key_str.as_bytes())
}

/// Development public key bundled in `resources/pub.key`
fn default_rs256_public_key() -> String {
    let key_str = include_str!("../../resources/pub.key");
    base64::engine::general_purpose::STANDARD.encode(key_str.as_bytes())
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            rs256_private_key: default_rs256_private_key(),
            rs256_public_key: default_rs256_public_key(),
        }
    }
}
