// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Security service library
//!
//! Stateless issuance and verification of RS256 access and refresh tokens,
//! with scope-based authorization of protected endpoints.
//!
//! - [`auth`]: the token engine
//! - [`config`]: YAML configuration
//! - [`server`]: the Rocket HTTP surface

pub mod auth;
pub mod config;
pub mod server;
