// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! RS256 token signing

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use log::{debug, error};
use std::sync::Arc;

use super::claims::ClaimSet;
use super::keys::KeyMaterial;
use crate::auth::error::{AuthError, AuthResult};

/// Mints signed tokens with the private key
///
/// Every token carries the `RS256` algorithm and the key thumbprint as `kid`
/// in its header.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    keys: Arc<KeyMaterial>,
    issuer: String,
}

impl TokenSigner {
    pub fn new(keys: Arc<KeyMaterial>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Key pair this signer signs with
    pub fn keys(&self) -> &Arc<KeyMaterial> {
        &self.keys
    }

    /// Sign a token for `subject` valid for `ttl` from now
    pub fn sign(&self, subject: &str, scope: &str, ttl: Duration) -> AuthResult<String> {
        self.sign_at(subject, scope, ttl, Utc::now())
    }

    /// Sign a token as if the current time were `now`
    pub fn sign_at(
        &self,
        subject: &str,
        scope: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let claims = ClaimSet::new(subject, self.issuer.as_str(), scope, now, ttl)?;
        self.sign_claims(&claims)
    }

    /// Sign an already built claim set
    pub fn sign_claims(&self, claims: &ClaimSet) -> AuthResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.keys.key_id().to_string());

        let token = encode(&header, claims, self.keys.encoding_key()).map_err(|e| {
            error!("Failed to sign token for {}: {}", claims.sub, e);
            AuthError::SigningFailed(e.to_string())
        })?;
        debug!(
            "Signed token for {} (scope: '{}', expires: {})",
            claims.sub,
            claims.scope,
            claims.expires_at()
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn signer() -> TokenSigner {
        let keys = KeyMaterial::from_pem(
            include_bytes!("../../../resources/private.key"),
            include_bytes!("../../../resources/pub.key"),
        )
        .unwrap();
        TokenSigner::new(Arc::new(keys), "test-issuer")
    }

    fn decode_segment(token: &str, index: usize) -> serde_json::Value {
        let segment = token.split('.').nth(index).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_compact_format_and_header() {
        let signer = signer();
        let token = signer.sign("user1", "USER", Duration::minutes(5)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let header = decode_segment(&token, 0);
        assert_eq!(header["alg"], "RS256");
        assert_eq!(header["kid"], signer.keys.key_id());
    }

    #[test]
    fn test_claims_are_embedded() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = signer()
            .sign_at("user3", "ADMIN USER", Duration::minutes(1), now)
            .unwrap();

        let payload = decode_segment(&token, 1);
        assert_eq!(payload["sub"], "user3");
        assert_eq!(payload["iss"], "test-issuer");
        assert_eq!(payload["scope"], "ADMIN USER");
        assert_eq!(payload["iat"], 1_700_000_000);
        assert_eq!(payload["exp"], 1_700_000_060);
    }

    #[test]
    fn test_signing_is_deterministic_for_fixed_time() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let signer = signer();
        let a = signer.sign_at("user1", "USER", Duration::minutes(5), now).unwrap();
        let b = signer.sign_at("user1", "USER", Duration::minutes(5), now).unwrap();
        assert_eq!(a, b);
    }
}
