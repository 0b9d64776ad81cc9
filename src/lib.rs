pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use cache::{CacheInvalidator, CacheLayer, CachePolicy};
pub use config::Config;
pub use error::AppError;
