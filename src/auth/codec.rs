// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact JWS encoding and decoding (HS256) on top of `jsonwebtoken`.
//!
//! Decoding checks run in a fixed order so that failures classify the same
//! way every time:
//!
//! 1. three segments with a non-empty header and payload, otherwise
//!    [`CodecError::Malformed`]
//! 2. readable header declaring `HS256`, otherwise `Malformed` or
//!    [`CodecError::UnsupportedAlgorithm`]
//! 3. signature verified, otherwise [`CodecError::BadSignature`]
//! 4. payload decoded into the requested claims type, otherwise
//!    [`CodecError::Payload`]
//!
//! Expiry is not checked here. The verifier compares `exp` against an
//! injected clock so the outcome stays a pure function of its inputs.

use std::fmt;
use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// The only signing algorithm issued or accepted.
pub const ALGORITHM: &str = "HS256";

/// Shared HMAC key.
///
/// Immutable after construction and cheap to clone; the issuer and the
/// verifier must be built from byte-identical secrets.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
    }
}

/// A signed token in compact serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Failures while encoding or decoding a token.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("token is not three base64url segments with a readable header")]
    Malformed,
    #[error("unsupported signing algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    #[error("signature does not match")]
    BadSignature,
    #[error("payload could not be decoded: {0}")]
    Payload(String),
    #[error("token could not be signed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Only the `alg` member, read when `jsonwebtoken` cannot parse the header
/// (algorithms it does not know, such as `none`).
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

fn peek_algorithm(header: &str) -> Option<String> {
    let bytes = Base64UrlUnpadded::decode_vec(header).ok()?;
    serde_json::from_slice::<RawHeader>(&bytes).ok().map(|h| h.alg)
}

/// Signs and verifies compact tokens with a single shared secret.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: SigningSecret,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        Self { secret, validation }
    }

    /// Serialize `claims` and sign them.
    pub fn encode<C: Serialize>(&self, claims: &C) -> Result<Token, CodecError> {
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), claims, &key)?;
        Ok(Token(token))
    }

    /// Verify `token` and decode its payload into `C`.
    pub fn decode<C: DeserializeOwned + Clone>(&self, token: &str) -> Result<C, CodecError> {
        let mut segments = token.split('.');
        let (header, signature) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() => (h, s),
                _ => return Err(CodecError::Malformed),
            };

        match decode_header(token) {
            Ok(parsed) if parsed.alg == Algorithm::HS256 => {}
            Ok(parsed) => return Err(CodecError::UnsupportedAlgorithm(format!("{:?}", parsed.alg))),
            Err(_) => {
                return Err(match peek_algorithm(header) {
                    Some(alg) if alg != ALGORITHM => CodecError::UnsupportedAlgorithm(alg),
                    _ => CodecError::Malformed,
                })
            }
        }

        if Base64UrlUnpadded::decode_vec(signature).is_err() {
            return Err(CodecError::BadSignature);
        }

        let key = DecodingKey::from_secret(self.secret.as_bytes());
        decode::<C>(token, &key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CodecError::BadSignature,
                ErrorKind::InvalidToken => CodecError::Malformed,
                ErrorKind::InvalidAlgorithm => CodecError::UnsupportedAlgorithm(e.to_string()),
                _ => CodecError::Payload(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningSecret::new("test-secret"))
    }

    fn forge(header: &str, payload: &str, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload),
            signature
        )
    }

    #[test]
    fn encodes_standard_header() {
        let token = codec().encode(&json!({"sub": "user-1"})).unwrap();
        let header = token.as_str().split('.').next().unwrap();
        let header: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header).unwrap()).unwrap();
        assert_eq!(header, json!({"alg": "HS256", "typ": "JWT"}));
    }

    #[test]
    fn decodes_what_it_encodes() {
        let token = codec().encode(&json!({"sub": "user-1", "exp": 10})).unwrap();
        let claims: Value = codec().decode(token.as_str()).unwrap();
        assert_eq!(claims["sub"], "user-1");
        assert_eq!(claims["exp"], 10);
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", ".."] {
            let result = codec().decode::<Value>(token);
            assert!(matches!(result, Err(CodecError::Malformed)), "{token:?}");
        }
    }

    #[test]
    fn unreadable_header_is_malformed() {
        let token = format!("{}.{}.sig", "%%%", URL_SAFE_NO_PAD.encode("{}"));
        assert!(matches!(codec().decode::<Value>(&token), Err(CodecError::Malformed)));

        let token = forge("not json", "{}", "sig");
        assert!(matches!(codec().decode::<Value>(&token), Err(CodecError::Malformed)));
    }

    #[test]
    fn other_algorithms_are_unsupported() {
        for alg in ["none", "HS512", "RS256"] {
            let token = forge(&format!(r#"{{"alg":"{alg}"}}"#), r#"{"sub":"x"}"#, "");
            match codec().decode::<Value>(&token) {
                Err(CodecError::UnsupportedAlgorithm(found)) => assert_eq!(found, alg),
                other => panic!("expected unsupported for {alg}, got {other:?}"),
            }
        }
    }

    #[test]
    fn different_secret_is_bad_signature() {
        let token = codec().encode(&json!({"sub": "user-1"})).unwrap();
        let other = TokenCodec::new(SigningSecret::new("another-secret"));
        assert!(matches!(
            other.decode::<Value>(token.as_str()),
            Err(CodecError::BadSignature)
        ));
    }

    #[test]
    fn undecodable_signature_is_bad_signature() {
        let token = codec().encode(&json!({"sub": "user-1"})).unwrap();
        let (signing_input, _) = token.as_str().rsplit_once('.').unwrap();
        let token = format!("{signing_input}.!!!");
        assert!(matches!(codec().decode::<Value>(&token), Err(CodecError::BadSignature)));
    }

    #[test]
    fn signed_payload_of_wrong_shape_is_payload_error() {
        let token = codec().encode(&json!("not an object")).unwrap();
        let result = codec().decode::<HashMap<String, Value>>(token.as_str());
        assert!(matches!(result, Err(CodecError::Payload(_))));
    }

    #[test]
    fn expiry_is_left_to_the_caller() {
        let token = codec().encode(&json!({"sub": "user-1", "exp": 1})).unwrap();
        let claims: Value = codec().decode(token.as_str()).unwrap();
        assert_eq!(claims["exp"], 1);

        let token = codec().encode(&json!({"sub": "user-1"})).unwrap();
        assert!(codec().decode::<Value>(token.as_str()).is_ok());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let secret = SigningSecret::new("super-secret-value");
        assert!(!format!("{secret:?}").contains("super-secret-value"));
    }

    #[test]
    fn interoperates_with_jsonwebtoken() {
        use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

        let exp = chrono::Utc::now().timestamp() + 600;
        let claims = json!({"sub": "user-1", "iat": exp - 600, "exp": exp});

        let ours = codec().encode(&claims).unwrap();
        let theirs = decode::<Value>(
            ours.as_str(),
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(theirs.claims["sub"], "user-1");

        let theirs = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        let ours: Value = codec().decode(&theirs).unwrap();
        assert_eq!(ours["exp"], exp);
    }
}
