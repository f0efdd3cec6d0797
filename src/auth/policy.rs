// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route bypass policy.
//!
//! Decides, per request, whether the gateway must verify a token. Rules are
//! checked in a fixed order and the first match wins:
//!
//! 1. exact paths open to every method (login, signup)
//! 2. exact paths open to specific methods only (`GET /posts`)
//! 3. open prefixes, each with exact carve-outs that stay authenticated
//!    (`/auth/**` except `/auth/me`)
//! 4. everything else requires authentication
//!
//! Prefix matching is segment-aware: `/auth` covers `/auth` and `/auth/x`
//! but not `/authors`. Carve-outs also match with trailing slashes.

use std::collections::{HashMap, HashSet};

use axum::http::Method;

/// Verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Bypass,
    RequireAuth,
}

#[derive(Debug, Clone)]
struct PrefixRule {
    prefix: String,
    exceptions: HashSet<String>,
}

impl PrefixRule {
    fn covers(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/'),
            None => false,
        }
    }

    /// Carve-outs ignore trailing slashes, so `/auth/me/` stays authenticated.
    fn excepts(&self, path: &str) -> bool {
        let trimmed = path.trim_end_matches('/');
        self.exceptions.contains(path) || (!trimmed.is_empty() && self.exceptions.contains(trimmed))
    }
}

/// Read-only rule set consulted on every gateway request.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    open_paths: HashSet<String>,
    method_scoped: HashMap<String, HashSet<Method>>,
    prefixes: Vec<PrefixRule>,
}

impl RoutePolicy {
    pub fn builder() -> RoutePolicyBuilder {
        RoutePolicyBuilder::default()
    }

    /// Rule set of the devloger platform.
    pub fn devloger() -> Self {
        Self::builder()
            .bypass_any_method("/auth/login")
            .bypass_any_method("/auth/signup")
            .bypass_method(Method::GET, "/posts")
            .bypass_prefix("/auth", ["/auth/me"])
            .build()
    }

    /// Classify a request.
    pub fn classify(&self, path: &str, method: &Method) -> RouteDecision {
        if self.open_paths.contains(path) {
            return RouteDecision::Bypass;
        }

        if self
            .method_scoped
            .get(path)
            .is_some_and(|methods| methods.contains(method))
        {
            return RouteDecision::Bypass;
        }

        if let Some(rule) = self.prefixes.iter().find(|rule| rule.covers(path)) {
            return if rule.excepts(path) {
                RouteDecision::RequireAuth
            } else {
                RouteDecision::Bypass
            };
        }

        RouteDecision::RequireAuth
    }
}

/// Builder for [`RoutePolicy`].
#[derive(Debug, Default)]
pub struct RoutePolicyBuilder {
    policy: RoutePolicy,
}

impl RoutePolicyBuilder {
    /// Open `path` to every method.
    pub fn bypass_any_method(mut self, path: impl Into<String>) -> Self {
        self.policy.open_paths.insert(path.into());
        self
    }

    /// Open `path` to `method` only.
    pub fn bypass_method(mut self, method: Method, path: impl Into<String>) -> Self {
        self.policy
            .method_scoped
            .entry(path.into())
            .or_default()
            .insert(method);
        self
    }

    /// Open everything under `prefix` except the exact `exceptions`.
    ///
    /// Prefix rules are checked in the order they are added.
    pub fn bypass_prefix<I, S>(mut self, prefix: impl Into<String>, exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.prefixes.push(PrefixRule {
            prefix: prefix.into(),
            exceptions: exceptions.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(self) -> RoutePolicy {
        self.policy
    }
}
