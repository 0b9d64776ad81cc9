pub mod cache;

pub use cache::{ResponseCacheMiddleware, ResponseCacheMiddlewareService};
