use serial_test::serial;
use std::{env, time::Duration};

use immo_api::config::Config;

mod common;

const VARS: &[&str] = &[
    "DATABASE_URL",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "BASE_URL",
    "LOCATIONS_DATASET",
    "CACHE_ENABLED",
    "CACHE_MAX_CAPACITY",
    "CACHE_LIST_TTL_SECS",
    "CACHE_DEFAULT_TTL_SECS",
    "CACHE_STORE_TIMEOUT_MS",
];

/// Run `f` with the given variables set and every other known variable cleared,
/// restoring the original environment afterwards.
fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
    let original: Vec<_> = VARS.iter().map(|key| (*key, env::var(key).ok())).collect();

    unsafe {
        for key in VARS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    f();

    unsafe {
        for (key, value) in original {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    common::setup_test_env();

    with_env(&[], || {
        let config = Config::from_env_only().unwrap();

        assert_eq!(config.database_url, "postgres://@localhost:5432/immo");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "development");
        assert!(config.is_development());
        assert!(config.locations_dataset.is_none());

        assert!(config.cache.enabled);
        assert_eq!(config.cache.list_ttl, Duration::from_secs(30));
        assert_eq!(config.cache.default_ttl, Duration::from_secs(300));
        assert_eq!(config.cache.store_timeout, Duration::from_millis(250));
    });
}

#[test]
#[serial]
fn test_config_custom_values() {
    with_env(
        &[
            ("DATABASE_URL", "postgres://immo:pw@db:5432/immo_test"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("ENVIRONMENT", "production"),
            ("LOCATIONS_DATASET", "/data/algeria_cities.sql"),
            ("CACHE_ENABLED", "off"),
            ("CACHE_MAX_CAPACITY", "50"),
            ("CACHE_LIST_TTL_SECS", "10"),
            ("CACHE_DEFAULT_TTL_SECS", "120"),
            ("CACHE_STORE_TIMEOUT_MS", "40"),
        ],
        || {
            let config = Config::from_env_only().unwrap();

            assert_eq!(config.server_address(), "0.0.0.0:9000");
            assert!(config.is_production());
            assert_eq!(
                config.locations_dataset.as_deref(),
                Some("/data/algeria_cities.sql")
            );
            assert!(!config.cache.enabled);
            assert_eq!(config.cache.max_capacity, 50);
            assert_eq!(config.cache.list_ttl, Duration::from_secs(10));
            assert_eq!(config.cache.default_ttl, Duration::from_secs(120));
            assert_eq!(config.cache.store_timeout, Duration::from_millis(40));
        },
    );
}

#[test]
#[serial]
fn test_unparseable_values_fall_back_to_defaults() {
    with_env(
        &[
            ("PORT", "not-a-port"),
            ("CACHE_LIST_TTL_SECS", "soon"),
            ("CACHE_ENABLED", "yes"),
            ("LOCATIONS_DATASET", "   "),
        ],
        || {
            let config = Config::from_env_only().unwrap();

            assert_eq!(config.port, 8080);
            assert_eq!(config.cache.list_ttl, Duration::from_secs(30));
            assert!(config.cache.enabled);
            assert!(config.locations_dataset.is_none());
        },
    );
}
