// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless HS256 JWT authentication shared by the gateway and the identity
//! service.
//!
//! ## Auth Flow
//!
//! 1. Identity service verifies credentials at `/auth/login` and issues a
//!    token signed with the shared secret (`TokenIssuer`)
//! 2. Client sends `Authorization: Bearer <token>` to the gateway
//! 3. Gateway:
//!    - Classifies the route (`RoutePolicy`); open routes pass through
//!    - Verifies signature, structure and expiry (`TokenVerifier`)
//!    - Overwrites `X-User-Id` with the verified `sub` (`IdentityPropagator`)
//!    - Answers failures with a `{code, message}` JSON body (`AuthError`)
//!
//! ## Security
//!
//! - Only `HS256` is accepted; `none` and every other algorithm are rejected
//! - Signatures are compared in constant time
//! - On authenticated routes, client-supplied identity headers are replaced
//!   before forwarding
//! - Expiry leeway defaults to zero

pub mod claims;
pub mod codec;
pub mod error;
pub mod issuer;
pub mod middleware;
pub mod pipeline;
pub mod policy;
pub mod propagation;
pub mod verifier;

pub use claims::{AuthContext, Claims, Identity};
pub use codec::{SigningSecret, Token, TokenCodec};
pub use error::{AuthError, ErrorBody};
pub use issuer::{IssueError, TokenIssuer};
pub use middleware::gateway_auth;
pub use pipeline::{Admission, Exchange, Pipeline, Stage, Step};
pub use policy::{RouteDecision, RoutePolicy};
pub use propagation::IdentityPropagator;
pub use verifier::{Clock, SystemClock, TokenVerifier};
