// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.

use chrono::Utc;

use super::claims::{AuthContext, Claims};
use super::codec::{CodecError, SigningSecret, TokenCodec};
use super::error::AuthError;

/// Source of the current time in Unix seconds.
///
/// Read once per request by the gateway; tests substitute a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Validates tokens issued by [`super::TokenIssuer`].
///
/// Holds only immutable data, so one instance is shared by every request
/// without locking.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    codec: TokenCodec,
    leeway: i64,
}

impl TokenVerifier {
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            codec: TokenCodec::new(secret),
            leeway: 0,
        }
    }

    /// Accept tokens up to `seconds` past their expiry.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = i64::try_from(seconds).unwrap_or(i64::MAX);
        self
    }

    /// Verify `token` at instant `now` (Unix seconds).
    ///
    /// Pure: the same inputs always produce the same result. Decoding detail
    /// never leaves this function; anything without a specific kind is
    /// reported as [`AuthError::General`].
    pub fn verify(&self, token: &str, now: i64) -> Result<AuthContext, AuthError> {
        let claims: Claims = self.codec.decode(token).map_err(|e| match e {
            CodecError::Malformed => AuthError::Malformed,
            CodecError::UnsupportedAlgorithm(_) => AuthError::Unsupported,
            CodecError::BadSignature => AuthError::BadSignature,
            other @ (CodecError::Payload(_) | CodecError::Encode(_)) => {
                tracing::debug!(error = %other, "Token rejected");
                AuthError::General
            }
        })?;

        if now >= claims.exp.saturating_add(self.leeway) {
            return Err(AuthError::Expired);
        }

        if claims.sub.is_empty() {
            return Err(AuthError::General);
        }

        Ok(AuthContext::from_claims(claims))
    }
}
