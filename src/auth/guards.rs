// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rocket request guards for Bearer token validation and scope checking
//!
//! - [`Authenticated`] validates the `Authorization: Bearer <token>` header
//! - [`RequireScope`] additionally demands one scope, named by a marker type
//!
//! Both guards fail before the handler runs. The failure is stored in the
//! request-local cache so the catchers can put the exact reason in the
//! `errorMessage` body.
//!
//! ```rust,no_run
//! use rocket::get;
//! use security_service::auth::guards::{AdminScope, RequireScope};
//!
//! #[get("/admin")]
//! fn admin(user: RequireScope<AdminScope>) -> String {
//!     format!("Hello {}", user.subject())
//! }
//! ```

use log::{debug, error};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use super::error::AuthError;
use super::issuance::TokenIssuanceService;
use super::jwt::ClaimSet;
use super::scope::ScopeGate;

/// Caller identity taken from a verified access token
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Verified claims
    pub claims: ClaimSet,
    /// The `scope` claim as a set
    pub scopes: BTreeSet<String>,
}

impl Authenticated {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }
}

/// Reason the last guard of this request failed, read back by the catchers
#[derive(Debug, Clone, Default)]
pub struct GuardFailure(pub Option<AuthError>);

/// Bearer validation result, computed once per request
struct BearerOutcome(Result<Authenticated, AuthError>);

/// Read the guard failure recorded for `request`, if any
pub fn guard_failure<'a>(request: &'a Request<'_>) -> Option<&'a AuthError> {
    request.local_cache(GuardFailure::default).0.as_ref()
}

fn reject<T>(request: &Request<'_>, error: AuthError) -> Outcome<T, AuthError> {
    debug!("Rejecting {} {}: {}", request.method(), request.uri(), error);
    let status = error.status();
    request.local_cache(|| GuardFailure(Some(error.clone())));
    Outcome::Error((status, error))
}

fn bearer_token<'a>(request: &'a Request<'_>) -> Option<&'a str> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(parse_bearer)
}

/// Token of a `Bearer` credential, the scheme name is case-insensitive
fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

fn authenticate(request: &Request<'_>, service: &TokenIssuanceService) -> Result<Authenticated, AuthError> {
    let token = bearer_token(request).ok_or(AuthError::MissingBearerToken)?;
    let claims = service.verifier().verify(token)?;
    Ok(Authenticated {
        scopes: claims.scopes(),
        claims,
    })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Authenticated {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let service = match request.rocket().state::<Arc<TokenIssuanceService>>() {
            Some(service) => service,
            None => {
                error!("TokenIssuanceService is not managed by this Rocket instance");
                return Outcome::Error((
                    Status::InternalServerError,
                    AuthError::InvalidToken("no verifier configured".to_string()),
                ));
            }
        };

        let outcome = request.local_cache(|| BearerOutcome(authenticate(request, service)));
        match &outcome.0 {
            Ok(user) => Outcome::Success(user.clone()),
            Err(err) => reject(request, err.clone()),
        }
    }
}

/// A scope an endpoint can require
pub trait ScopeRequirement: Send + Sync + 'static {
    const SCOPE: &'static str;
}

/// Requires the `USER` scope
pub struct UserScope;

impl ScopeRequirement for UserScope {
    const SCOPE: &'static str = "USER";
}

/// Requires the `ADMIN` scope
pub struct AdminScope;

impl ScopeRequirement for AdminScope {
    const SCOPE: &'static str = "ADMIN";
}

/// Authenticated caller holding scope `S`
pub struct RequireScope<S: ScopeRequirement> {
    user: Authenticated,
    _scope: PhantomData<S>,
}

impl<S: ScopeRequirement> RequireScope<S> {
    pub fn into_inner(self) -> Authenticated {
        self.user
    }
}

impl<S: ScopeRequirement> Deref for RequireScope<S> {
    type Target = Authenticated;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

#[rocket::async_trait]
impl<'r, S: ScopeRequirement> FromRequest<'r> for RequireScope<S> {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = match request.guard::<Authenticated>().await {
            Outcome::Success(user) => user,
            Outcome::Error(failure) => return Outcome::Error(failure),
            Outcome::Forward(status) => return Outcome::Forward(status),
        };

        match ScopeGate::authorize(&user.scopes, S::SCOPE) {
            Ok(()) => Outcome::Success(RequireScope {
                user,
                _scope: PhantomData,
            }),
            Err(err) => reject(request, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("BEARER  abc.def.ghi "), Some("abc.def.ghi"));
    }

    #[test]
    fn test_other_credentials_are_ignored() {
        assert_eq!(parse_bearer("Basic dXNlcjE6MTIzNA=="), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer   "), None);
        assert_eq!(parse_bearer("abc.def.ghi"), None);
    }
}
