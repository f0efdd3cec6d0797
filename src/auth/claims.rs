// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified identity carried through a request.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Claims carried in the token payload.
///
/// `sub` is the one canonical identity field. Tokens are never inspected for
/// alternative identity claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: String,

    /// Email address (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Issued at timestamp
    #[serde(default, deserialize_with = "numeric_date")]
    pub iat: i64,

    /// Expiration timestamp
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,
}

/// RFC 7519 NumericDate: integer or fractional seconds, floored to whole
/// seconds.
fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumericDate {
        Whole(i64),
        Fractional(f64),
    }

    match NumericDate::deserialize(deserializer)? {
        NumericDate::Whole(seconds) => Ok(seconds),
        NumericDate::Fractional(seconds) if seconds.is_finite() => Ok(seconds.floor() as i64),
        NumericDate::Fractional(_) => Err(D::Error::custom("NumericDate must be finite")),
    }
}

/// Identity handed to the issuer at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            nickname: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }
}

/// Identity of the caller, produced only by a successful verification.
///
/// Lives in the request extensions for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: String,
    email: Option<String>,
    nickname: Option<String>,
    expires_at: i64,
}

impl AuthContext {
    pub(crate) fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            nickname: claims.nickname,
            expires_at: claims.exp,
        }
    }

    /// Canonical user ID (`sub` claim)
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Token expiration (Unix timestamp)
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let claims = Claims {
            sub: "42".to_string(),
            email: None,
            nickname: None,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value, json!({"sub": "42", "iat": 1_700_000_000, "exp": 1_700_003_600}));
    }

    #[test]
    fn missing_subject_decodes_as_empty() {
        let claims: Claims = serde_json::from_value(json!({"iat": 1, "exp": 2})).unwrap();
        assert!(claims.sub.is_empty());
    }

    #[test]
    fn fractional_dates_are_floored() {
        let claims: Claims =
            serde_json::from_value(json!({"sub": "1", "iat": 1.7e9, "exp": 1.0e10 + 0.75})).unwrap();
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 10_000_000_000);
    }

    #[test]
    fn non_numeric_dates_are_rejected() {
        assert!(serde_json::from_value::<Claims>(json!({"sub": "1", "exp": "tomorrow"})).is_err());
    }

    #[test]
    fn from_claims_copies_identity() {
        let context = AuthContext::from_claims(Claims {
            sub: "user_123".to_string(),
            email: Some("a@b.c".to_string()),
            nickname: Some("neo".to_string()),
            iat: 0,
            exp: 3600,
        });
        assert_eq!(context.user_id(), "user_123");
        assert_eq!(context.email(), Some("a@b.c"));
        assert_eq!(context.nickname(), Some("neo"));
        assert_eq!(context.expires_at(), 3600);
    }
}
