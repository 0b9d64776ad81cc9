use actix_web::web;

use crate::cache::RouteCacheRules;

pub mod blog;
pub mod health;
pub mod locations;
pub mod properties;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure).service(
        web::scope("/api")
            .configure(properties::configure)
            .configure(blog::configure)
            .configure(users::configure)
            .configure(locations::configure),
    );
}

/// Routes whose responses must never be served from the cache.
pub fn cache_rules() -> RouteCacheRules {
    RouteCacheRules::new()
        .disable_group("/health")
        .disable_handler("/api/properties/random")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_rules_cover_health_and_random() {
        let rules = cache_rules();
        assert!(rules.is_disabled("/health"));
        assert!(rules.is_disabled("/health/cache"));
        assert!(rules.is_disabled("/api/properties/random"));
        assert!(!rules.is_disabled("/api/properties"));
        assert!(!rules.is_disabled("/api/properties/7f1c"));
    }
}
