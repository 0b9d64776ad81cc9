//! Per-request cache decision: cacheable or not, under which key, for how long.

use actix_web::{dev::ResourceDef, http::Method};
use std::time::Duration;

use crate::config::CacheConfig;

/// TTL for collection listings, which change as soon as a listing is posted.
pub const LIST_TTL: Duration = Duration::from_secs(30);

/// TTL for everything else that is cacheable (detail pages, lookups).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// API roots whose bare collection path is served with [`LIST_TTL`].
pub const LIST_FAMILIES: &[&str] = &[
    "/api/properties",
    "/api/blog",
    "/api/users",
    "/api/hotels",
    "/api/restaurants",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    Bypass,
    Cache { key: String, ttl: Duration },
}

/// Cache key for a request: method and path with the query string verbatim.
///
/// Headers are not part of the key, so a response that varies on
/// `Accept-Language` or `Authorization` is shared between callers.
pub fn cache_key(method: &Method, path_and_query: &str) -> String {
    format!("{method}:{path_and_query}")
}

fn strip_query(path_and_query: &str) -> &str {
    path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path)
}

//============================================================================
// List routes
//============================================================================

/// Decides, from the remainder of the path after a family prefix, whether the
/// request targets the collection itself.
pub type CollectionPredicate = fn(&str) -> bool;

/// `/api/properties` and `/api/properties/` are the collection; anything
/// deeper is a single item or a sub-resource.
pub fn collection_root(rest: &str) -> bool {
    rest.is_empty() || rest == "/"
}

#[derive(Debug, Clone)]
pub struct ListRoute {
    prefix: String,
    is_collection_root: CollectionPredicate,
}

impl ListRoute {
    pub fn new(prefix: impl Into<String>, is_collection_root: CollectionPredicate) -> Self {
        Self {
            prefix: prefix.into(),
            is_collection_root,
        }
    }

    pub fn collection(prefix: impl Into<String>) -> Self {
        Self::new(prefix, collection_root)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                (self.is_collection_root)(rest)
            }
            _ => false,
        }
    }
}

//============================================================================
// Route opt-outs
//============================================================================

/// Static table of routes whose cacheability is pinned at startup.
///
/// Entries exist at two levels: a handler (an exact route pattern such as
/// `/api/properties/random`) and a group (a path prefix such as `/health`).
/// A matching handler entry always wins over a matching group entry.
#[derive(Debug, Clone, Default)]
pub struct RouteCacheRules {
    handlers: Vec<(ResourceDef, bool)>,
    groups: Vec<(ResourceDef, bool)>,
}

impl RouteCacheRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, pattern: &str, disabled: bool) -> Self {
        self.handlers.push((ResourceDef::new(pattern), disabled));
        self
    }

    pub fn group(mut self, prefix: &str, disabled: bool) -> Self {
        self.groups.push((ResourceDef::prefix(prefix), disabled));
        self
    }

    pub fn disable_handler(self, pattern: &str) -> Self {
        self.handler(pattern, true)
    }

    pub fn disable_group(self, prefix: &str) -> Self {
        self.group(prefix, true)
    }

    /// Whether caching is turned off for `path` (query string excluded).
    pub fn is_disabled(&self, path: &str) -> bool {
        let lookup = |table: &[(ResourceDef, bool)]| {
            table
                .iter()
                .find(|(def, _)| def.is_match(path))
                .map(|(_, disabled)| *disabled)
        };

        lookup(&self.handlers)
            .or_else(|| lookup(&self.groups))
            .unwrap_or(false)
    }
}

//============================================================================
// Resolver
//============================================================================

#[derive(Debug, Clone)]
pub struct CachePolicy {
    list_routes: Vec<ListRoute>,
    rules: RouteCacheRules,
    list_ttl: Duration,
    default_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(LIST_TTL, DEFAULT_TTL).with_list_families(LIST_FAMILIES)
    }
}

impl CachePolicy {
    /// Policy with no list routes and no opt-outs.
    pub fn new(list_ttl: Duration, default_ttl: Duration) -> Self {
        Self {
            list_routes: Vec::new(),
            rules: RouteCacheRules::new(),
            list_ttl,
            default_ttl,
        }
    }

    /// Standard list families with the TTLs from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.list_ttl, config.default_ttl).with_list_families(LIST_FAMILIES)
    }

    pub fn with_list_route(mut self, route: ListRoute) -> Self {
        self.list_routes.push(route);
        self
    }

    pub fn with_list_families(mut self, prefixes: &[&str]) -> Self {
        self.list_routes
            .extend(prefixes.iter().map(|prefix| ListRoute::collection(*prefix)));
        self
    }

    pub fn with_rules(mut self, rules: RouteCacheRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn list_ttl(&self) -> Duration {
        self.list_ttl
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Longest TTL this policy can hand out.
    pub fn max_ttl(&self) -> Duration {
        self.list_ttl.max(self.default_ttl)
    }

    pub fn is_list(&self, path: &str) -> bool {
        self.list_routes.iter().any(|route| route.matches(path))
    }

    pub fn ttl_for(&self, path: &str) -> Duration {
        if self.is_list(path) {
            self.list_ttl
        } else {
            self.default_ttl
        }
    }

    /// Decide for a request whose route flag is already known.
    pub fn decide(
        &self,
        method: &Method,
        path_and_query: &str,
        cache_disabled: bool,
    ) -> CacheDecision {
        if *method != Method::GET || cache_disabled {
            return CacheDecision::Bypass;
        }

        CacheDecision::Cache {
            key: cache_key(method, path_and_query),
            ttl: self.ttl_for(strip_query(path_and_query)),
        }
    }

    /// Decide for a request, reading its route flag from the opt-out table.
    pub fn resolve(&self, method: &Method, path_and_query: &str) -> CacheDecision {
        let disabled = self.rules.is_disabled(strip_query(path_and_query));
        self.decide(method, path_and_query, disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ttl_of(decision: CacheDecision) -> Duration {
        match decision {
            CacheDecision::Cache { ttl, .. } => ttl,
            CacheDecision::Bypass => panic!("expected a cacheable decision"),
        }
    }

    #[test]
    fn test_only_get_is_cacheable() {
        let policy = CachePolicy::default();
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::HEAD] {
            assert_eq!(
                policy.resolve(&method, "/api/properties"),
                CacheDecision::Bypass,
                "{method} must bypass the cache"
            );
        }
    }

    #[test]
    fn test_key_keeps_query_string_verbatim() {
        let policy = CachePolicy::default();
        let first = policy.resolve(&Method::GET, "/api/properties?wilaya=Alger");
        let second = policy.resolve(&Method::GET, "/api/properties?wilaya=Oran");

        assert_eq!(
            first,
            CacheDecision::Cache {
                key: "GET:/api/properties?wilaya=Alger".to_string(),
                ttl: LIST_TTL,
            }
        );
        assert_ne!(first, second);
    }

    #[test]
    fn test_list_and_detail_ttls() {
        let policy = CachePolicy::default();

        assert_eq!(ttl_of(policy.resolve(&Method::GET, "/api/properties")), LIST_TTL);
        assert_eq!(ttl_of(policy.resolve(&Method::GET, "/api/blog/")), LIST_TTL);
        assert_eq!(ttl_of(policy.resolve(&Method::GET, "/api/users?page=3")), LIST_TTL);

        assert_eq!(
            ttl_of(policy.resolve(&Method::GET, "/api/properties/0b9d")),
            DEFAULT_TTL
        );
        assert_eq!(
            ttl_of(policy.resolve(&Method::GET, "/api/users-archive")),
            DEFAULT_TTL
        );
        assert_eq!(
            ttl_of(policy.resolve(&Method::GET, "/api/locations/wilayas")),
            DEFAULT_TTL
        );
    }

    #[test]
    fn test_new_family_registers_without_touching_matcher() {
        fn listing_or_search(rest: &str) -> bool {
            collection_root(rest) || rest == "/search"
        }

        let policy = CachePolicy::new(LIST_TTL, DEFAULT_TTL)
            .with_list_route(ListRoute::new("/api/agencies", listing_or_search));

        assert!(policy.is_list("/api/agencies"));
        assert!(policy.is_list("/api/agencies/search"));
        assert!(!policy.is_list("/api/agencies/12"));
        assert!(!policy.is_list("/api/properties"));
    }

    #[test]
    fn test_disable_flag_short_circuits() {
        let policy = CachePolicy::default();
        assert_eq!(
            policy.decide(&Method::GET, "/api/properties", true),
            CacheDecision::Bypass
        );
    }

    #[test]
    fn test_handler_rule_overrides_group_rule() {
        let rules = RouteCacheRules::new()
            .disable_group("/api/admin")
            .handler("/api/admin/summary", false)
            .disable_handler("/api/properties/random");

        assert!(rules.is_disabled("/api/admin"));
        assert!(rules.is_disabled("/api/admin/users/4"));
        assert!(!rules.is_disabled("/api/admin/summary"));
        assert!(rules.is_disabled("/api/properties/random"));
        assert!(!rules.is_disabled("/api/properties/5"));
        assert!(!rules.is_disabled("/api/administrators"));

        let policy = CachePolicy::default().with_rules(rules);
        assert_eq!(
            policy.resolve(&Method::GET, "/api/admin/users?page=1"),
            CacheDecision::Bypass
        );
        assert!(matches!(
            policy.resolve(&Method::GET, "/api/admin/summary"),
            CacheDecision::Cache { .. }
        ));
    }

    #[test]
    fn test_parameterised_handler_pattern() {
        let rules = RouteCacheRules::new().disable_handler("/api/users/{id}/sessions");
        assert!(rules.is_disabled("/api/users/42/sessions"));
        assert!(!rules.is_disabled("/api/users/42"));
    }
}
