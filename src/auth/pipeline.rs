// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway authentication pipeline.
//!
//! An ordered list of [`Stage`]s run against one [`Exchange`]. Each stage
//! either lets the next one run, admits the request as it stands, or rejects
//! it with an [`AuthError`]. The driver stops at the first admit or reject.
//!
//! The driver fails closed: a request is only admitted without credentials
//! when a stage explicitly forwards it, and an authenticated request is only
//! admitted once its outbound headers carry the propagated identity.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap, Method};

use super::claims::AuthContext;
use super::error::AuthError;
use super::policy::{RouteDecision, RoutePolicy};
use super::propagation::IdentityPropagator;
use super::verifier::TokenVerifier;

const BEARER_PREFIX: &str = "Bearer ";

/// Per-request state threaded through the stages.
#[derive(Debug)]
pub struct Exchange<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub inbound: &'a HeaderMap,
    pub now: i64,
    pub token: Option<&'a str>,
    pub context: Option<AuthContext>,
    pub outbound: Option<HeaderMap>,
}

impl<'a> Exchange<'a> {
    pub fn new(method: &'a Method, path: &'a str, inbound: &'a HeaderMap, now: i64) -> Self {
        Self {
            method,
            path,
            inbound,
            now,
            token: None,
            context: None,
            outbound: None,
        }
    }
}

/// Result of a single stage.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Run the next stage
    Continue,
    /// Stop and admit the request
    Forward,
    /// Stop and answer with this error
    Reject(AuthError),
}

/// Outcome of a full pipeline run.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    /// Forward the inbound request unchanged
    Bypass,
    /// Forward with `headers` replacing the inbound headers
    Authenticated {
        context: AuthContext,
        headers: HeaderMap,
    },
}

/// One step of the pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, exchange: &mut Exchange<'_>) -> Step;
}

/// Forwards requests the policy leaves open.
pub struct ClassifyRoute {
    policy: Arc<RoutePolicy>,
}

impl ClassifyRoute {
    pub fn new(policy: Arc<RoutePolicy>) -> Self {
        Self { policy }
    }
}

impl Stage for ClassifyRoute {
    fn name(&self) -> &'static str {
        "classify_route"
    }

    fn run(&self, exchange: &mut Exchange<'_>) -> Step {
        match self.policy.classify(exchange.path, exchange.method) {
            RouteDecision::Bypass => Step::Forward,
            RouteDecision::RequireAuth => Step::Continue,
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub struct ExtractBearer;

impl Stage for ExtractBearer {
    fn name(&self) -> &'static str {
        "extract_bearer"
    }

    fn run(&self, exchange: &mut Exchange<'_>) -> Step {
        let inbound = exchange.inbound;
        let token = inbound
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => {
                exchange.token = Some(token);
                Step::Continue
            }
            None => Step::Reject(AuthError::MissingOrMalformedHeader),
        }
    }
}

/// Verifies the extracted token.
pub struct VerifyToken {
    verifier: TokenVerifier,
}

impl VerifyToken {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

impl Stage for VerifyToken {
    fn name(&self) -> &'static str {
        "verify_token"
    }

    fn run(&self, exchange: &mut Exchange<'_>) -> Step {
        let Some(token) = exchange.token else {
            return Step::Reject(AuthError::MissingOrMalformedHeader);
        };

        match self.verifier.verify(token, exchange.now) {
            Ok(context) => {
                exchange.context = Some(context);
                Step::Continue
            }
            Err(kind) => Step::Reject(kind),
        }
    }
}

/// Builds outbound headers carrying the verified identity.
pub struct PropagateIdentity {
    propagator: IdentityPropagator,
}

impl PropagateIdentity {
    pub fn new(propagator: IdentityPropagator) -> Self {
        Self { propagator }
    }
}

impl Stage for PropagateIdentity {
    fn name(&self) -> &'static str {
        "propagate_identity"
    }

    fn run(&self, exchange: &mut Exchange<'_>) -> Step {
        let Some(context) = exchange.context.as_ref() else {
            return Step::Reject(AuthError::General);
        };

        match self.propagator.attach(exchange.inbound, context) {
            Ok(headers) => {
                exchange.outbound = Some(headers);
                Step::Forward
            }
            Err(kind) => Step::Reject(kind),
        }
    }
}

/// Ordered stages plus the driver loop.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Standard gateway chain: classify, extract, verify, propagate.
    pub fn gateway(
        policy: Arc<RoutePolicy>,
        verifier: TokenVerifier,
        propagator: IdentityPropagator,
    ) -> Self {
        Self::new(vec![
            Box::new(ClassifyRoute::new(policy)),
            Box::new(ExtractBearer),
            Box::new(VerifyToken::new(verifier)),
            Box::new(PropagateIdentity::new(propagator)),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage in order until one forwards or rejects.
    pub fn run(&self, exchange: &mut Exchange<'_>) -> Result<Admission, AuthError> {
        for stage in &self.stages {
            match stage.run(exchange) {
                Step::Continue => {}
                Step::Forward => return Self::admit(exchange),
                Step::Reject(kind) => {
                    tracing::debug!(stage = stage.name(), code = kind.code(), "stage rejected request");
                    return Err(kind);
                }
            }
        }

        // ran out of stages without an explicit verdict
        Err(AuthError::General)
    }

    fn admit(exchange: &mut Exchange<'_>) -> Result<Admission, AuthError> {
        match (exchange.context.take(), exchange.outbound.take()) {
            (None, None) => Ok(Admission::Bypass),
            (Some(context), Some(headers)) => Ok(Admission::Authenticated { context, headers }),
            _ => Err(AuthError::General),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Identity;
    use crate::auth::codec::SigningSecret;
    use crate::auth::issuer::TokenIssuer;
    use axum::http::HeaderValue;
    use std::time::Duration;

    const T: i64 = 1_700_000_000;

    fn pipeline() -> Pipeline {
        Pipeline::gateway(
            Arc::new(RoutePolicy::devloger()),
            TokenVerifier::new(SigningSecret::new("test-secret")),
            IdentityPropagator::default(),
        )
    }

    fn bearer(user_id: &str) -> HeaderMap {
        let token = TokenIssuer::new(SigningSecret::new("test-secret"), Duration::from_secs(3600))
            .issue(&Identity::new(user_id), T)
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn run(method: Method, path: &str, headers: &HeaderMap, now: i64) -> Result<Admission, AuthError> {
        let mut exchange = Exchange::new(&method, path, headers, now);
        pipeline().run(&mut exchange)
    }

    #[test]
    fn stages_run_in_documented_order() {
        assert_eq!(
            pipeline().stage_names(),
            vec!["classify_route", "extract_bearer", "verify_token", "propagate_identity"]
        );
    }

    #[test]
    fn bypass_route_skips_credentials() {
        let result = run(Method::POST, "/auth/login", &HeaderMap::new(), T);
        assert_eq!(result, Ok(Admission::Bypass));
    }

    #[test]
    fn bypass_route_ignores_broken_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer garbage"));
        assert_eq!(run(Method::GET, "/posts", &headers, T), Ok(Admission::Bypass));
    }

    #[test]
    fn missing_header_is_rejected() {
        let result = run(Method::POST, "/posts", &HeaderMap::new(), T);
        assert_eq!(result, Err(AuthError::MissingOrMalformedHeader));
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        for value in ["Basic dXNlcjpwYXNz", "bearer abc", "Bearer", "Bearer    ", "Token abc"] {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
            assert_eq!(
                run(Method::POST, "/posts", &headers, T),
                Err(AuthError::MissingOrMalformedHeader),
                "{value:?}"
            );
        }
    }

    #[test]
    fn valid_token_is_admitted_with_identity() {
        let mut headers = bearer("user-1");
        headers.insert("x-user-id", HeaderValue::from_static("spoofed"));

        match run(Method::POST, "/posts", &headers, T + 10) {
            Ok(Admission::Authenticated { context, headers: outbound }) => {
                assert_eq!(context.user_id(), "user-1");
                assert_eq!(outbound.get("x-user-id").unwrap(), "user-1");
                assert!(outbound.get(AUTHORIZATION).is_some());
            }
            other => panic!("expected authenticated admission, got {other:?}"),
        }
        assert_eq!(headers.get("x-user-id").unwrap(), "spoofed");
    }

    #[test]
    fn expired_token_is_rejected() {
        let result = run(Method::GET, "/auth/me", &bearer("user-1"), T + 3601);
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn verifier_kinds_pass_through() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer a.b"));
        assert_eq!(run(Method::GET, "/auth/me", &headers, T), Err(AuthError::Malformed));
    }

    #[test]
    fn chain_without_propagation_fails_closed() {
        let pipeline = Pipeline::new(vec![
            Box::new(ExtractBearer),
            Box::new(VerifyToken::new(TokenVerifier::new(SigningSecret::new("test-secret")))),
        ]);
        let headers = bearer("user-1");
        let method = Method::GET;
        let mut exchange = Exchange::new(&method, "/posts/1", &headers, T);
        assert_eq!(pipeline.run(&mut exchange), Err(AuthError::General));
    }

    #[test]
    fn empty_pipeline_fails_closed() {
        let headers = HeaderMap::new();
        let method = Method::GET;
        let mut exchange = Exchange::new(&method, "/", &headers, T);
        assert_eq!(Pipeline::new(Vec::new()).run(&mut exchange), Err(AuthError::General));
    }
}
