// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Devloger Auth - JWT Gateway & Identity Service
//!
//! One binary, two roles selected by `SERVICE_MODE`:
//!
//! - **gateway**: verifies HS256 bearer tokens, applies the route bypass
//!   policy, overwrites the identity header and forwards to upstreams.
//! - **identity**: signup, login and token issuance.
//!
//! ## Modules
//!
//! - `api` - Identity service HTTP handlers (Axum)
//! - `auth` - Token codec, issuer, verifier, route policy and gateway pipeline
//! - `gateway` - Upstream routing and request forwarding
//! - `config` - Environment configuration
//! - `server` - Serving and graceful shutdown
//! - `telemetry` - Tracing subscriber and HTTP layers

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod password;
pub mod server;
pub mod state;
pub mod store;
pub mod telemetry;
