// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Token endpoint, key publication and error rendering
//!
//! Every failure leaves the server as `{"errorMessage": "..."}` with the
//! status given by [`AuthError::status`].

use rocket::form::{Form, FromForm};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{catch, get, options, post, Request, State};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::guards::guard_failure;
use crate::auth::{AuthError, GrantRequest, JwkKeySet, TokenIssuanceService, TokenResponse};

/// Error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_message: String,
}

impl From<&AuthError> for ErrorResponse {
    fn from(error: &AuthError) -> Self {
        Self {
            error_message: error.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for AuthError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        (self.status(), Json(ErrorResponse::from(&self))).respond_to(request)
    }
}

/// Form accepted by `POST /token`
///
/// No `Debug` derive: the form carries a password.
#[derive(FromForm)]
pub struct TokenForm {
    #[field(name = "grantType")]
    pub grant_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[field(name = "withRefreshToken", default = false)]
    pub with_refresh_token: bool,
    #[field(name = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl From<TokenForm> for GrantRequest {
    fn from(form: TokenForm) -> Self {
        GrantRequest::from_parts(
            form.grant_type.as_deref(),
            form.username,
            form.password,
            form.refresh_token,
            form.with_refresh_token,
        )
    }
}

/// Issue tokens for the `password` or `refreshToken` grant
#[post("/token", data = "<form>")]
pub fn token(
    form: Form<TokenForm>,
    service: &State<Arc<TokenIssuanceService>>,
) -> Result<Json<TokenResponse>, AuthError> {
    let request = GrantRequest::from(form.into_inner());
    service.issue(&request).map(Json)
}

/// Public verification key as a JSON Web Key Set
#[get("/.well-known/jwks.json")]
pub fn jwks(keys: &State<JwkKeySet>) -> Json<&JwkKeySet> {
    Json(keys.inner())
}

/// Answer CORS preflight requests, the fairing adds the headers
#[options("/<_path..>")]
pub async fn options(_path: PathBuf) -> Result<(), std::io::Error> {
    Ok(())
}

/// Render every error status as a JSON body
///
/// When a request guard rejected the request its reason is used, otherwise
/// the standard reason phrase of the status.
#[catch(default)]
pub fn default_catcher(status: Status, request: &Request<'_>) -> (Status, Json<ErrorResponse>) {
    let error_message = match guard_failure(request) {
        Some(error) if error.status() == status => error.to_string(),
        _ => status.reason().unwrap_or("Unknown error").to_string(),
    };
    (status, Json(ErrorResponse { error_message }))
}
