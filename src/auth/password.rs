// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Password hash verification
//!
//! The token engine never looks at hashes itself, it asks a
//! [`PasswordVerifier`]. The bundled implementation understands the
//! Base64-wrapped Unix crypt hashes stored in the configuration file
//! (`openssl passwd -5 <password> | base64 -w0`).

use base64::Engine;
use log::debug;

/// Checks a plaintext password against a stored hash
///
/// Implementations must compare in constant time.
pub trait PasswordVerifier: Send + Sync {
    /// Returns `true` when `plaintext` hashes to `stored_hash`
    fn matches(&self, plaintext: &str, stored_hash: &str) -> bool;
}

/// Verifier for Base64-encoded Unix crypt hashes (`$5$`, `$6$`, `$2y$`, ...)
///
/// Hash comparison is delegated to `pwhash`, which compares digests in
/// constant time.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixCryptVerifier;

impl UnixCryptVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Decode the stored Base64 value into the `$algo$salt$hash` string
    ///
    /// `openssl passwd | base64` keeps the trailing newline, so a final
    /// `\n` and `\r` are stripped.
    pub fn decode_stored_hash(stored_hash: &str) -> Option<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(stored_hash.trim())
            .ok()?;
        let bytes = bytes.strip_suffix(b"\n").unwrap_or(&bytes);
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        String::from_utf8(bytes.to_vec()).ok()
    }
}

impl PasswordVerifier for UnixCryptVerifier {
    fn matches(&self, plaintext: &str, stored_hash: &str) -> bool {
        match Self::decode_stored_hash(stored_hash) {
            Some(hash) => pwhash::unix::verify(plaintext, &hash),
            None => {
                debug!("Stored password hash is not valid Base64/UTF-8");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // openssl passwd -5 -salt Qm3xT9aLp2Vz 1234 | base64 -w0
    const HASH_1234: &str =
        "JDUkUW0zeFQ5YUxwMlZ6JE1ieTZ3dzVqZ3pneFdMY1BpQm9TL2ZZcE5sVDdzakkzTVlxVzBQMDQ4c0E=";

    #[test]
    fn test_matching_password() {
        assert!(UnixCryptVerifier::new().matches("1234", HASH_1234));
    }

    #[test]
    fn test_wrong_password() {
        assert!(!UnixCryptVerifier::new().matches("12345", HASH_1234));
        assert!(!UnixCryptVerifier::new().matches("", HASH_1234));
    }

    #[test]
    fn test_trailing_newline_is_stripped() {
        let raw = "$5$Qm3xT9aLp2Vz$Mby6ww5jgzgxWLcPiBoS/fYpNlT7sjI3MYqW0P048sA\n";
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        assert!(UnixCryptVerifier::new().matches("1234", &encoded));
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!UnixCryptVerifier::new().matches("1234", "not base64 at all!"));
        let not_crypt = base64::engine::general_purpose::STANDARD.encode("plaintext");
        assert!(!UnixCryptVerifier::new().matches("plaintext", &not_crypt));
    }
}
