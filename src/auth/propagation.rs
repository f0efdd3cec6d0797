// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity propagation to downstream services.
//!
//! Downstream services trust the identity header blindly, so whatever the
//! client sent under that name is discarded and replaced with the verified
//! identity.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::claims::AuthContext;
use super::error::AuthError;

/// Default trusted identity header.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Writes the verified identity onto the outbound header set.
#[derive(Debug, Clone)]
pub struct IdentityPropagator {
    header: HeaderName,
}

impl Default for IdentityPropagator {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_IDENTITY_HEADER))
    }
}

impl IdentityPropagator {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    /// Build the outbound headers for an authenticated request.
    ///
    /// `inbound` is left untouched. Every inbound value of the identity header
    /// is replaced by exactly one value: the verified user ID.
    pub fn attach(&self, inbound: &HeaderMap, context: &AuthContext) -> Result<HeaderMap, AuthError> {
        let value = HeaderValue::from_str(context.user_id()).map_err(|_| AuthError::General)?;
        let mut outbound = inbound.clone();
        outbound.insert(self.header.clone(), value);
        Ok(outbound)
    }
}
