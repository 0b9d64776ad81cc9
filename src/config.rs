use anyhow::Result;
use std::{env, time::Duration};

use crate::cache::policy::{DEFAULT_TTL, LIST_TTL};

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_capacity: u64,
    pub list_ttl: Duration,
    pub default_ttl: Duration,
    /// Upper bound on any single store call made while serving a request.
    pub store_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: DEFAULT_CACHE_CAPACITY,
            list_ttl: LIST_TTL,
            default_ttl: DEFAULT_TTL,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

impl CacheConfig {
    fn from_vars() -> Self {
        Self {
            enabled: env::var("CACHE_ENABLED")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off"))
                .unwrap_or(true),
            max_capacity: parse_var("CACHE_MAX_CAPACITY", DEFAULT_CACHE_CAPACITY),
            list_ttl: Duration::from_secs(parse_var("CACHE_LIST_TTL_SECS", LIST_TTL.as_secs())),
            default_ttl: Duration::from_secs(parse_var(
                "CACHE_DEFAULT_TTL_SECS",
                DEFAULT_TTL.as_secs(),
            )),
            store_timeout: Duration::from_millis(parse_var(
                "CACHE_STORE_TIMEOUT_MS",
                DEFAULT_STORE_TIMEOUT_MS,
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    /// SQL export of the commune/daira/wilaya table, loaded at startup.
    pub locations_dataset: Option<String>,
    pub cache: CacheConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://@localhost:5432/immo".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            client_base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            locations_dataset: env::var("LOCATIONS_DATASET")
                .ok()
                .filter(|path| !path.trim().is_empty()),
            cache: CacheConfig::from_vars(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
