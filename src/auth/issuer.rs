// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance for the identity service.

use std::time::Duration;

use super::claims::{Claims, Identity};
use super::codec::{CodecError, SigningSecret, Token, TokenCodec};

/// Errors raised while issuing a token.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("identity must not be empty")]
    EmptyIdentity,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Builds and signs access tokens.
///
/// Uses the same secret and algorithm as [`super::TokenVerifier`]; a token
/// issued at `now` verifies for any instant in `[now, now + ttl)`.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: SigningSecret, ttl: Duration) -> Self {
        Self {
            codec: TokenCodec::new(secret),
            ttl,
        }
    }

    /// Issue a token for `identity` at `now` (Unix seconds).
    pub fn issue(&self, identity: &Identity, now: i64) -> Result<Token, IssueError> {
        if identity.user_id.is_empty() {
            return Err(IssueError::EmptyIdentity);
        }

        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: identity.user_id.clone(),
            email: identity.email.clone(),
            nickname: identity.nickname.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        Ok(self.codec.encode(&claims)?)
    }
}
