// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream selection by path prefix.

use url::Url;

use crate::config::UpstreamRoute;

/// Longest-prefix routing table.
#[derive(Debug, Clone, Default)]
pub struct UpstreamTable {
    routes: Vec<UpstreamRoute>,
}

impl UpstreamTable {
    pub fn new(mut routes: Vec<UpstreamRoute>) -> Self {
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    /// Route owning `path`, if any. Matching is segment-aware.
    pub fn resolve(&self, path: &str) -> Option<&UpstreamRoute> {
        self.routes.iter().find(|route| {
            route.prefix.is_empty()
                || path
                    .strip_prefix(route.prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// Absolute upstream URL for `path_and_query` on `route`.
    pub fn target_url(route: &UpstreamRoute, path_and_query: &str) -> Result<Url, url::ParseError> {
        let base = route.target.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path_and_query}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_routes;

    fn table() -> UpstreamTable {
        UpstreamTable::new(
            parse_routes("/auth=http://auth:8081,/posts=http://posts:8082,/posts/drafts=http://drafts:9000/v2")
                .unwrap(),
        )
    }

    #[test]
    fn resolves_by_prefix() {
        let table = table();
        assert_eq!(table.resolve("/auth/login").unwrap().prefix, "/auth");
        assert_eq!(table.resolve("/posts").unwrap().prefix, "/posts");
        assert_eq!(table.resolve("/posts/42").unwrap().prefix, "/posts");
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(table().resolve("/posts/drafts/1").unwrap().prefix, "/posts/drafts");
    }

    #[test]
    fn unknown_or_partial_segments_do_not_match() {
        assert!(table().resolve("/comments").is_none());
        assert!(table().resolve("/authors").is_none());
    }

    #[test]
    fn target_keeps_path_and_query() {
        let table = table();
        let route = table.resolve("/posts/drafts/1").unwrap();
        let url = UpstreamTable::target_url(route, "/posts/drafts/1?page=2").unwrap();
        assert_eq!(url.as_str(), "http://drafts:9000/v2/posts/drafts/1?page=2");

        let route = table.resolve("/auth/login").unwrap();
        let url = UpstreamTable::target_url(route, "/auth/login").unwrap();
        assert_eq!(url.as_str(), "http://auth:8081/auth/login");
    }
}
