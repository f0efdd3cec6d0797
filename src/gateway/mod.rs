// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Edge Gateway
//!
//! Every request except `GET /health` passes through
//! [`gateway_auth`](crate::auth::gateway_auth) and, if admitted, is forwarded
//! to the upstream owning its path prefix.

use axum::{middleware, routing::get, Router};

use crate::api::health;
use crate::auth::gateway_auth;
use crate::state::GatewayState;
use crate::telemetry;

pub mod proxy;
pub mod upstream;

pub use upstream::UpstreamTable;

pub fn router(state: GatewayState) -> Router {
    let proxied = Router::new()
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(state.clone(), gateway_auth))
        .with_state(state);

    let app = Router::new()
        .route("/health", get(health::liveness))
        .fallback_service(proxied);

    telemetry::http_layers(app)
}
