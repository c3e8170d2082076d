// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rocket instance assembly

use anyhow::{Context, Result};
use log::debug;
use rocket::figment::Figment;
use rocket::{catchers, routes, Build, Rocket};
use std::sync::Arc;

use super::cors::CORS;
use super::{api, handlers};
use crate::auth::TokenIssuanceService;
use crate::config::Config;

/// Rocket figment carrying the `server` section of the configuration
pub fn figment_from_config(config: &Config) -> Figment {
    rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("ident", config.server.name.clone()))
}

/// Build the Rocket instance serving the token endpoint and the protected
/// resources
///
/// The issuance service is shared as managed state; the guards reach the
/// verifier through it.
pub fn build_rocket(figment: Figment, service: Arc<TokenIssuanceService>) -> Result<Rocket<Build>> {
    let jwks = service
        .signer()
        .keys()
        .jwks()
        .context("Failed to build the JSON Web Key Set")?;
    debug!("Publishing {} key(s) in the JWKS", jwks.keys.len());

    Ok(rocket::custom(figment)
        .attach(CORS)
        .mount(
            "/",
            routes![
                handlers::options,
                handlers::token,
                handlers::jwks,
                api::data_test,
                api::save_data,
            ],
        )
        .register("/", catchers![handlers::default_catcher])
        .manage(service)
        .manage(jwks))
}
