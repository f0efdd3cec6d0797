// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::ErrorBody,
    models::{LoginRequest, LoginResponse, SignupRequest, UserResponse},
    state::IdentityState,
    telemetry,
};

pub mod auth;
pub mod health;

/// Router of the identity service.
pub fn router(state: IdentityState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .with_state(state);

    let app = Router::new()
        .nest("/auth", auth_routes)
        .route("/health", get(health::liveness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    telemetry::http_layers(app)
}

#[derive(OpenApi)]
#[openapi(
    paths(auth::signup, auth::login, auth::me, health::liveness),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            LoginResponse,
            UserResponse,
            ErrorBody,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Signup, login and token issuance"),
        (name = "Health", description = "Liveness")
    )
)]
struct ApiDoc;
