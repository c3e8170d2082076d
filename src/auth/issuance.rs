// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Token issuance
//!
//! [`TokenIssuanceService`] turns a [`GrantRequest`] into a
//! [`TokenResponse`]. Two grants are supported:
//!
//! - `password`: the identity comes from [`CredentialAuthenticator`]
//! - `refreshToken`: the refresh token is verified, then the directory is
//!   queried again so the new access token carries the subject's
//!   **current** authorities, never the ones frozen in the refresh token
//!
//! Once the identity is known both grants mint tokens the same way. The
//! access token lifetime depends on whether a refresh token is requested:
//! a client able to renew gets a short access token, one that cannot gets a
//! longer one (see [`TokensConfig`]).

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::authenticator::CredentialAuthenticator;
use super::directory::UserDirectory;
use super::error::{AuthError, AuthResult};
use super::identity::Identity;
use super::jwt::{KeyMaterial, TokenSigner, TokenVerifier};
use super::password::{PasswordVerifier, UnixCryptVerifier};
use crate::config::{Config, TokensConfig};

/// Wire value of the password grant
pub const GRANT_PASSWORD: &str = "password";
/// Wire value of the refresh token grant
pub const GRANT_REFRESH_TOKEN: &str = "refreshToken";

/// A token request, one variant per grant type
#[derive(Clone, PartialEq, Eq)]
pub enum GrantRequest {
    Password {
        username: String,
        password: String,
        with_refresh_token: bool,
    },
    RefreshToken {
        refresh_token: Option<String>,
        with_refresh_token: bool,
    },
    /// Any other `grantType`, kept verbatim for the error message
    Unsupported(String),
}

impl GrantRequest {
    /// Build a request from the loose fields of a token form
    ///
    /// Fields irrelevant to the selected grant are ignored. A missing
    /// `grantType` is treated as an unsupported (empty) grant type.
    pub fn from_parts(
        grant_type: Option<&str>,
        username: Option<String>,
        password: Option<String>,
        refresh_token: Option<String>,
        with_refresh_token: bool,
    ) -> Self {
        match grant_type.unwrap_or_default() {
            GRANT_PASSWORD => GrantRequest::Password {
                username: username.unwrap_or_default(),
                password: password.unwrap_or_default(),
                with_refresh_token,
            },
            GRANT_REFRESH_TOKEN => GrantRequest::RefreshToken {
                refresh_token,
                with_refresh_token,
            },
            other => GrantRequest::Unsupported(other.to_string()),
        }
    }

    pub fn password(username: &str, password: &str, with_refresh_token: bool) -> Self {
        GrantRequest::Password {
            username: username.to_string(),
            password: password.to_string(),
            with_refresh_token,
        }
    }

    pub fn refresh_token(refresh_token: &str, with_refresh_token: bool) -> Self {
        GrantRequest::RefreshToken {
            refresh_token: Some(refresh_token.to_string()),
            with_refresh_token,
        }
    }

    /// The `grantType` this request was parsed from
    pub fn grant_type(&self) -> &str {
        match self {
            GrantRequest::Password { .. } => GRANT_PASSWORD,
            GrantRequest::RefreshToken { .. } => GRANT_REFRESH_TOKEN,
            GrantRequest::Unsupported(grant_type) => grant_type,
        }
    }

    pub fn with_refresh_token(&self) -> bool {
        match self {
            GrantRequest::Password {
                with_refresh_token, ..
            }
            | GrantRequest::RefreshToken {
                with_refresh_token, ..
            } => *with_refresh_token,
            GrantRequest::Unsupported(_) => false,
        }
    }
}

/// Keep passwords and refresh tokens out of logs
impl std::fmt::Debug for GrantRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantRequest::Password {
                username,
                with_refresh_token,
                ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("with_refresh_token", with_refresh_token)
                .finish(),
            GrantRequest::RefreshToken {
                refresh_token,
                with_refresh_token,
            } => f
                .debug_struct("RefreshToken")
                .field("refresh_token", &refresh_token.as_ref().map(|_| "<redacted>"))
                .field("with_refresh_token", with_refresh_token)
                .finish(),
            GrantRequest::Unsupported(grant_type) => {
                f.debug_tuple("Unsupported").field(grant_type).finish()
            }
        }
    }
}

/// Successful token endpoint payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Grant-type state machine and token minting
///
/// All collaborators are handed in at construction, the service holds no
/// mutable state and can be shared across requests behind an `Arc`.
pub struct TokenIssuanceService {
    authenticator: CredentialAuthenticator,
    directory: Arc<dyn UserDirectory>,
    signer: TokenSigner,
    verifier: TokenVerifier,
    tokens: TokensConfig,
}

impl TokenIssuanceService {
    pub fn new(
        authenticator: CredentialAuthenticator,
        directory: Arc<dyn UserDirectory>,
        signer: TokenSigner,
        verifier: TokenVerifier,
        tokens: TokensConfig,
    ) -> Self {
        Self {
            authenticator,
            directory,
            signer,
            verifier,
            tokens,
        }
    }

    /// Wire the whole engine from the configuration
    ///
    /// Key material is loaded and self-tested here; any failure is returned
    /// so the caller can refuse to start.
    pub fn from_config(config: &Config, directory: Arc<dyn UserDirectory>) -> Result<Self> {
        let keys = Arc::new(KeyMaterial::from_config(&config.keys)?);
        info!(
            "Loaded {}-bit RS256 key pair (kid: {})",
            keys.modulus_bits(),
            keys.key_id()
        );

        let passwords: Arc<dyn PasswordVerifier> = Arc::new(UnixCryptVerifier::new());
        let authenticator = CredentialAuthenticator::new(directory.clone(), passwords);
        let signer = TokenSigner::new(keys.clone(), config.tokens.issuer.as_str());
        let verifier = TokenVerifier::new(keys, &config.tokens.issuer, config.tokens.leeway);

        Ok(Self::new(
            authenticator,
            directory,
            signer,
            verifier,
            config.tokens.clone(),
        ))
    }

    /// Verifier sharing this service's key, for protecting resources
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Handle a grant request at the current time
    pub fn issue(&self, request: &GrantRequest) -> AuthResult<TokenResponse> {
        self.issue_at(request, Utc::now())
    }

    /// Handle a grant request as if the current time were `now`
    ///
    /// Both tokens of one response share the same `iat`.
    pub fn issue_at(&self, request: &GrantRequest, now: DateTime<Utc>) -> AuthResult<TokenResponse> {
        debug!("Token request: {:?}", request);

        let identity = self.resolve_identity(request, now).map_err(|err| {
            warn!(
                "Grant '{}' rejected ({}): {}",
                request.grant_type(),
                err.kind(),
                err
            );
            err
        })?;

        let with_refresh_token = request.with_refresh_token();
        let scope = identity.scope();

        let access_token = self.signer.sign_at(
            &identity.subject,
            &scope,
            self.tokens.access_ttl(with_refresh_token),
            now,
        )?;

        let refresh_token = if with_refresh_token {
            Some(self.signer.sign_at(
                &identity.subject,
                &scope,
                self.tokens.refresh_ttl(),
                now,
            )?)
        } else {
            None
        };

        info!(
            "Grant '{}' issued tokens for {} (scope: '{}', refresh token: {})",
            request.grant_type(),
            identity.subject,
            scope,
            with_refresh_token
        );

        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    fn resolve_identity(&self, request: &GrantRequest, now: DateTime<Utc>) -> AuthResult<Identity> {
        match request {
            GrantRequest::Password {
                username, password, ..
            } => self.authenticator.authenticate(username, password),
            GrantRequest::RefreshToken { refresh_token, .. } => {
                let refresh_token = refresh_token
                    .as_deref()
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .ok_or(AuthError::MissingRefreshToken)?;

                let claims = self.verifier.verify_at(refresh_token, now)?;

                // Only the subject is taken from the refresh token, the
                // authorities are looked up again
                let entry = self
                    .directory
                    .find_by_username(&claims.sub)
                    .ok_or_else(|| AuthError::UnknownSubject(claims.sub.clone()))?;

                if entry.identity().scope() != claims.scope {
                    debug!(
                        "Authorities of {} changed since refresh token issuance: '{}' -> '{}'",
                        claims.sub,
                        claims.scope,
                        entry.identity().scope()
                    );
                }
                Ok(entry.into_identity())
            }
            GrantRequest::Unsupported(grant_type) => {
                Err(AuthError::UnsupportedGrantType(grant_type.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::InMemoryUserDirectory;
    use crate::config::AccessConfig;
    use chrono::Duration;

    struct Fixture {
        directory: Arc<InMemoryUserDirectory>,
        service: TokenIssuanceService,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(InMemoryUserDirectory::from_access_config(
            &AccessConfig::default(),
        ));
        let service = TokenIssuanceService::from_config(&Config::default(), directory.clone())
            .unwrap();
        Fixture { directory, service }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_password_grant_with_refresh_token() {
        let f = fixture();
        let response = f
            .service
            .issue_at(&GrantRequest::password("user1", "1234", true), t0())
            .unwrap();

        let access = f.service.verifier().verify_at(&response.access_token, t0()).unwrap();
        assert_eq!(access.sub, "user1");
        assert_eq!(access.scope, "USER");
        assert_eq!(access.ttl(), Duration::minutes(1));

        let refresh = f
            .service
            .verifier()
            .verify_at(response.refresh_token.as_deref().unwrap(), t0())
            .unwrap();
        assert_eq!(refresh.ttl(), Duration::minutes(5));
        assert_eq!(refresh.iat, access.iat);
    }

    #[test]
    fn test_password_grant_without_refresh_token() {
        let f = fixture();
        let response = f
            .service
            .issue_at(&GrantRequest::password("user3", "1234", false), t0())
            .unwrap();
        assert!(response.refresh_token.is_none());

        let access = f.service.verifier().verify_at(&response.access_token, t0()).unwrap();
        assert_eq!(access.scope, "ADMIN USER");
        assert_eq!(access.ttl(), Duration::minutes(5));
    }

    #[test]
    fn test_bad_credentials() {
        let f = fixture();
        for request in [
            GrantRequest::password("user1", "wrong", true),
            GrantRequest::password("nobody", "1234", true),
            GrantRequest::from_parts(Some("password"), None, None, None, false),
        ] {
            assert_eq!(
                f.service.issue_at(&request, t0()),
                Err(AuthError::InvalidCredentials)
            );
        }
    }

    #[test]
    fn test_refresh_grant_reresolves_authorities() {
        let f = fixture();
        let first = f
            .service
            .issue_at(&GrantRequest::password("user1", "1234", true), t0())
            .unwrap();
        let refresh_token = first.refresh_token.unwrap();

        f.directory.set_authorities("user1", ["USER", "ADMIN"]);

        let later = t0() + Duration::seconds(90);
        let second = f
            .service
            .issue_at(&GrantRequest::refresh_token(&refresh_token, false), later)
            .unwrap();
        let access = f.service.verifier().verify_at(&second.access_token, later).unwrap();
        assert_eq!(access.sub, "user1");
        assert_eq!(access.scope, "ADMIN USER");
        assert_eq!(access.iat, later.timestamp());
        assert_eq!(access.ttl(), Duration::minutes(5));
    }

    #[test]
    fn test_refresh_grant_with_new_refresh_token() {
        let f = fixture();
        let refresh_token = f
            .service
            .issue_at(&GrantRequest::password("user1", "1234", true), t0())
            .unwrap()
            .refresh_token
            .unwrap();

        let later = t0() + Duration::seconds(30);
        let response = f
            .service
            .issue_at(&GrantRequest::refresh_token(&refresh_token, true), later)
            .unwrap();

        let access = f.service.verifier().verify_at(&response.access_token, later).unwrap();
        assert_eq!(access.sub, "user1");
        assert_eq!(access.ttl(), Duration::minutes(1));

        let refresh = f
            .service
            .verifier()
            .verify_at(response.refresh_token.as_deref().unwrap(), later)
            .unwrap();
        assert_eq!(refresh.sub, "user1");
        assert_eq!(refresh.ttl(), Duration::minutes(5));
        assert_eq!(refresh.iat, later.timestamp());
        assert_ne!(refresh.exp, f.service.verifier().verify_at(&refresh_token, t0()).unwrap().exp);
    }

    #[test]
    fn test_out_of_range_lifetime_fails_without_panicking() {
        let mut config = Config::default();
        config.tokens.access_token_ttl = 100_000_000_000_000;
        let directory = Arc::new(InMemoryUserDirectory::from_access_config(&config.access));
        let service = TokenIssuanceService::from_config(&config, directory).unwrap();

        let err = service
            .issue_at(&GrantRequest::password("user1", "1234", false), t0())
            .unwrap_err();
        assert!(matches!(err, AuthError::SigningFailed(_)), "{:?}", err);
    }

    #[test]
    fn test_refresh_grant_unknown_subject() {
        let f = fixture();
        let refresh_token = f
            .service
            .issue_at(&GrantRequest::password("user2", "1234", true), t0())
            .unwrap()
            .refresh_token
            .unwrap();

        f.directory.remove("user2");

        assert_eq!(
            f.service
                .issue_at(&GrantRequest::refresh_token(&refresh_token, true), t0()),
            Err(AuthError::UnknownSubject("user2".to_string()))
        );
    }

    #[test]
    fn test_refresh_grant_missing_token() {
        let f = fixture();
        for token in [None, Some(String::new()), Some("  ".to_string())] {
            let request = GrantRequest::from_parts(Some("refreshToken"), None, None, token, true);
            assert_eq!(
                f.service.issue_at(&request, t0()),
                Err(AuthError::MissingRefreshToken)
            );
        }
    }

    #[test]
    fn test_refresh_grant_expired_token() {
        let f = fixture();
        let refresh_token = f
            .service
            .issue_at(&GrantRequest::password("user1", "1234", true), t0())
            .unwrap()
            .refresh_token
            .unwrap();

        let err = f
            .service
            .issue_at(
                &GrantRequest::refresh_token(&refresh_token, true),
                t0() + Duration::minutes(5),
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken(_)), "{:?}", err);
    }

    #[test]
    fn test_refresh_grant_garbage_token() {
        let f = fixture();
        let err = f
            .service
            .issue_at(&GrantRequest::refresh_token("garbage", true), t0())
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)), "{:?}", err);
    }

    #[test]
    fn test_unsupported_grant_type() {
        let f = fixture();
        let request = GrantRequest::from_parts(Some("client_credentials"), None, None, None, true);
        assert_eq!(
            f.service.issue_at(&request, t0()),
            Err(AuthError::UnsupportedGrantType("client_credentials".into()))
        );

        let request = GrantRequest::from_parts(None, None, None, None, false);
        assert_eq!(request, GrantRequest::Unsupported(String::new()));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let request = GrantRequest::password("user1", "hunter2", false);
        let debug = format!("{:?}", request);
        assert!(debug.contains("user1"));
        assert!(!debug.contains("hunter2"));

        let request = GrantRequest::refresh_token("eyJhbGciOi", false);
        assert!(!format!("{:?}", request).contains("eyJ"));
    }

    #[test]
    fn test_response_wire_shape() {
        let response = TokenResponse {
            access_token: "a".into(),
            refresh_token: None,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"accessToken":"a"}"#
        );
    }
}
