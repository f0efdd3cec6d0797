// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for the gateway.
//!
//! Runs the [`Pipeline`](super::pipeline::Pipeline) once per request. On
//! rejection the error response is returned directly and the inner service
//! never runs.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .fallback(proxy::forward)
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), gateway_auth))
//!     .with_state(state);
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::pipeline::{Admission, Exchange};
use crate::state::GatewayState;

/// Authentication middleware function.
pub async fn gateway_auth(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let now = state.clock.now();
    let (mut parts, body) = request.into_parts();

    let admission = {
        let mut exchange = Exchange::new(&parts.method, parts.uri.path(), &parts.headers, now);
        state.pipeline.run(&mut exchange)
    };

    match admission {
        Ok(Admission::Bypass) => {
            tracing::debug!(method = %parts.method, path = %parts.uri.path(), "Route bypasses authentication");
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(Admission::Authenticated { context, headers }) => {
            tracing::info!(
                user_id = %context.user_id(),
                method = %parts.method,
                path = %parts.uri.path(),
                "JWT validated"
            );
            parts.headers = headers;
            parts.extensions.insert(context);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(kind) => {
            tracing::warn!(
                code = kind.code(),
                method = %parts.method,
                path = %parts.uri.path(),
                "JWT validation failed: {}",
                kind.message()
            );
            kind.into_response()
        }
    }
}
