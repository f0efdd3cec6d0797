// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication failures and their wire representation.
//!
//! Every failure is one of six client-input kinds, each bound to a stable
//! `(code, message, status)` triple. The response body is error contract v1:
//!
//! ```json
//! {"code": "JWT_EXPIRED", "message": "Token has expired"}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Version of the `{code, message}` error body.
pub const ERROR_CONTRACT_VERSION: u32 = 1;

/// Authentication error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthError {
    /// No authorization header, or not a `Bearer` credential
    MissingOrMalformedHeader,
    /// Token has expired
    Expired,
    /// Token header declares an algorithm other than HS256
    Unsupported,
    /// Token is not a three-segment compact JWS
    Malformed,
    /// Token signature is invalid
    BadSignature,
    /// Any other verification failure
    General,
}

/// Error body written for every rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedHeader => "JWT_MISSING",
            AuthError::Expired => "JWT_EXPIRED",
            AuthError::Unsupported => "JWT_UNSUPPORTED",
            AuthError::Malformed => "JWT_MALFORMED",
            AuthError::BadSignature => "JWT_INVALID_SIGNATURE",
            AuthError::General => "JWT_INVALID",
        }
    }

    /// Get the human-readable message for this error.
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedHeader => "Authorization header is missing or malformed",
            AuthError::Expired => "Token has expired",
            AuthError::Unsupported => "Unsupported JWT",
            AuthError::Malformed => "Invalid JWT format",
            AuthError::BadSignature => "JWT signature does not match",
            AuthError::General => "JWT validation failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingOrMalformedHeader
            | AuthError::Expired
            | AuthError::BadSignature
            | AuthError::General => StatusCode::UNAUTHORIZED,
            AuthError::Malformed | AuthError::Unsupported => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.message().to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthError {}

/// Map a failure to its status and body.
pub fn respond(kind: AuthError) -> (StatusCode, Json<ErrorBody>) {
    (kind.status_code(), Json(kind.body()))
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        respond(self).into_response()
    }
}
