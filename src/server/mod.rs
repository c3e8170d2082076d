// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP surface of the security service
//!
//! | Route | Guard | Purpose |
//! |-------|-------|---------|
//! | `POST /token` | none | `password` and `refreshToken` grants |
//! | `GET /.well-known/jwks.json` | none | public verification key |
//! | `GET /dataTest` | `USER` | sample protected resource |
//! | `POST /saveData` | `ADMIN` | sample protected resource |
//! | `OPTIONS /<path..>` | none | CORS preflight |
//!
//! ## Example
//!
//! ```no_run
//! use security_service::auth::{InMemoryUserDirectory, TokenIssuanceService};
//! use security_service::config::Config;
//! use security_service::server;
//! use std::sync::Arc;
//!
//! #[rocket::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let directory = Arc::new(InMemoryUserDirectory::from_access_config(&config.access));
//!     let service = Arc::new(TokenIssuanceService::from_config(&config, directory)?);
//!     let rocket = server::build_rocket(server::figment_from_config(&config), service)?;
//!     rocket.launch().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod builder;
pub mod cors;
pub mod handlers;

pub use builder::{build_rocket, figment_from_config};
pub use handlers::ErrorResponse;
