// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::http::HeaderName;
use tokio::sync::RwLock;

use crate::auth::{
    Clock, IdentityPropagator, Pipeline, RoutePolicy, SystemClock, TokenIssuer, TokenVerifier,
};
use crate::config::Settings;
use crate::gateway::UpstreamTable;
use crate::password::{Argon2Hasher, CredentialHasher};
use crate::store::UserStore;

/// State of the edge gateway. Everything in it is immutable after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub clock: Arc<dyn Clock>,
    pub upstreams: Arc<UpstreamTable>,
    pub client: reqwest::Client,
    pub body_limit: usize,
}

impl GatewayState {
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let verifier =
            TokenVerifier::new(settings.jwt.secret.clone()).with_leeway(settings.jwt.leeway_secs);
        let pipeline = Pipeline::gateway(
            Arc::new(RoutePolicy::devloger()),
            verifier,
            IdentityPropagator::new(settings.identity_header.clone()),
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            clock: Arc::new(SystemClock),
            upstreams: Arc::new(UpstreamTable::new(settings.routes.clone())),
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            body_limit: settings.body_limit,
        })
    }

    /// Gateway with the devloger policy, no upstreams and a fixed secret.
    #[cfg(test)]
    pub fn for_tests(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let pipeline = Pipeline::gateway(
            Arc::new(RoutePolicy::devloger()),
            TokenVerifier::new(crate::auth::SigningSecret::new(secret)),
            IdentityPropagator::default(),
        );
        Self {
            pipeline: Arc::new(pipeline),
            clock,
            upstreams: Arc::new(UpstreamTable::default()),
            client: reqwest::Client::new(),
            body_limit: crate::config::DEFAULT_BODY_LIMIT,
        }
    }
}

/// State of the identity service.
#[derive(Clone)]
pub struct IdentityState {
    pub issuer: Arc<TokenIssuer>,
    pub users: Arc<RwLock<UserStore>>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub clock: Arc<dyn Clock>,
    pub identity_header: HeaderName,
}

impl IdentityState {
    pub fn new(issuer: TokenIssuer, identity_header: HeaderName) -> Self {
        Self {
            issuer: Arc::new(issuer),
            users: Arc::new(RwLock::new(UserStore::new())),
            hasher: Arc::new(Argon2Hasher),
            clock: Arc::new(SystemClock),
            identity_header,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            TokenIssuer::new(settings.jwt.secret.clone(), settings.jwt.ttl),
            settings.identity_header.clone(),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
