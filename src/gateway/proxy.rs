// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request forwarding to upstream services.
//!
//! Runs behind [`gateway_auth`](crate::auth::gateway_auth), so by the time a
//! request arrives here its headers are final: either untouched (bypassed
//! route) or carrying the verified identity.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
};

use super::upstream::UpstreamTable;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Connection-scoped headers that must not be forwarded (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Forward the request to the upstream owning its path.
pub async fn forward(State(state): State<GatewayState>, request: Request) -> Response {
    match forward_inner(&state, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn forward_inner(state: &GatewayState, request: Request) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let route = state
        .upstreams
        .resolve(path)
        .ok_or_else(|| ApiError::not_found("ROUTE_NOT_FOUND", format!("No upstream for {path}")))?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(path);
    let url = UpstreamTable::target_url(route, path_and_query)
        .map_err(|e| ApiError::internal(format!("Invalid upstream URL: {e}")))?;

    let body = to_bytes(body, state.body_limit)
        .await
        .map_err(|_| ApiError::payload_too_large("Request body exceeds the gateway limit"))?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    tracing::debug!(method = %parts.method, upstream = %url, "Forwarding request");

    let upstream = state
        .client
        .request(parts.method, url.clone())
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(upstream = %url, error = %e, "Upstream request failed");
            ApiError::bad_gateway("Upstream service unavailable")
        })?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);
    response_headers.remove(header::CONTENT_LENGTH);

    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::warn!(upstream = %url, error = %e, "Failed to read upstream response");
        ApiError::bad_gateway("Upstream response could not be read")
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}
