// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! RS256 token verification
//!
//! Verification needs only the public key. The checks run in this order and
//! the first failure wins:
//!
//! 1. structure: three Base64URL segments with a JSON header and claim set
//!    → [`AuthError::MalformedToken`]
//! 2. signature, algorithm and issuer → [`AuthError::InvalidToken`]
//! 3. expiry, `exp > now` (plus the configured leeway) → [`AuthError::ExpiredToken`]

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, Algorithm, Validation};
use log::debug;
use std::sync::Arc;

use super::claims::ClaimSet;
use super::keys::KeyMaterial;
use crate::auth::error::{AuthError, AuthResult};

/// Validates tokens minted by [`TokenSigner`](super::TokenSigner)
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyMaterial>,
    validation: Validation,
    leeway: u64,
}

impl TokenVerifier {
    /// Create a verifier accepting RS256 tokens from `issuer`
    ///
    /// `leeway` is the clock skew in seconds tolerated on `exp`, zero for
    /// strict expiry.
    pub fn new(keys: Arc<KeyMaterial>, issuer: &str, leeway: u64) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        // exp is checked by hand so that the clock can be injected and the
        // comparison stays strict
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[issuer]);

        Self {
            keys,
            validation,
            leeway,
        }
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> AuthResult<ClaimSet> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<ClaimSet> {
        let data = decode::<ClaimSet>(token, self.keys.decoding_key(), &self.validation)
            .map_err(classify)?;
        let claims = data.claims;

        let deadline = claims
            .exp
            .saturating_add(i64::try_from(self.leeway).unwrap_or(i64::MAX));
        if deadline <= now.timestamp() {
            debug!("Token for {} expired at {}", claims.sub, claims.expires_at());
            return Err(AuthError::ExpiredToken(claims.expires_at().to_rfc3339()));
        }

        Ok(claims)
    }
}

/// Map a `jsonwebtoken` failure onto the token error taxonomy
fn classify(err: JwtError) -> AuthError {
    let message = err.to_string();
    let error = match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidAlgorithmName => AuthError::MalformedToken(message),
        _ => AuthError::InvalidToken(message),
    };
    debug!("Token rejected: {}", error);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenSigner;
    use chrono::Duration;

    fn keys() -> Arc<KeyMaterial> {
        Arc::new(
            KeyMaterial::from_pem(
                include_bytes!("../../../resources/private.key"),
                include_bytes!("../../../resources/pub.key"),
            )
            .unwrap(),
        )
    }

    fn pair(leeway: u64) -> (TokenSigner, TokenVerifier) {
        let keys = keys();
        (
            TokenSigner::new(keys.clone(), "test-issuer"),
            TokenVerifier::new(keys, "test-issuer", leeway),
        )
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let (signer, verifier) = pair(0);
        let token = signer
            .sign_at("user1", "USER", Duration::minutes(5), t0())
            .unwrap();
        let claims = verifier
            .verify_at(&token, t0() + Duration::seconds(299))
            .unwrap();
        assert_eq!(claims.sub, "user1");
        assert_eq!(claims.scope, "USER");
    }

    #[test]
    fn test_expiry_is_strict() {
        let (signer, verifier) = pair(0);
        let token = signer
            .sign_at("user1", "USER", Duration::minutes(5), t0())
            .unwrap();
        let err = verifier
            .verify_at(&token, t0() + Duration::minutes(5))
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken(_)), "{:?}", err);
    }

    #[test]
    fn test_leeway_extends_expiry() {
        let (signer, verifier) = pair(30);
        let token = signer
            .sign_at("user1", "USER", Duration::minutes(5), t0())
            .unwrap();
        assert!(verifier
            .verify_at(&token, t0() + Duration::seconds(320))
            .is_ok());
        assert!(verifier
            .verify_at(&token, t0() + Duration::seconds(330))
            .is_err());
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let (signer, verifier) = pair(0);
        let token = signer.sign("user1", "USER", Duration::minutes(5)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let mut payload: Vec<char> = parts[1].chars().collect();
        let middle = payload.len() / 2;
        payload[middle] = if payload[middle] == 'A' { 'B' } else { 'A' };
        let tampered = format!(
            "{}.{}.{}",
            parts[0],
            payload.into_iter().collect::<String>(),
            parts[2]
        );

        let err = verifier.verify(&tampered).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)), "{:?}", err);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (_, verifier) = pair(0);
        for token in ["", "abc", "a.b", "not.a.token"] {
            let err = verifier.verify(token).unwrap_err();
            assert!(matches!(err, AuthError::MalformedToken(_)), "{}: {:?}", token, err);
        }
    }

    #[test]
    fn test_foreign_issuer_is_invalid() {
        let keys = keys();
        let signer = TokenSigner::new(keys.clone(), "someone-else");
        let verifier = TokenVerifier::new(keys, "test-issuer", 0);
        let token = signer.sign("user1", "USER", Duration::minutes(5)).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_key_is_invalid() {
        let other = KeyMaterial::from_pem(
            include_bytes!("../../../tests/fixtures/other_private.key"),
            include_bytes!("../../../tests/fixtures/other_pub.key"),
        )
        .unwrap();
        let signer = TokenSigner::new(Arc::new(other), "test-issuer");
        let (_, verifier) = pair(0);
        let token = signer.sign("user1", "USER", Duration::minutes(5)).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
