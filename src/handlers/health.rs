use actix_web::{HttpResponse, Result, web};
use serde_json::json;

use crate::{cache::CacheLayer, handlers::shared::ApiResponse};

pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    })))
}

/// Cache counters, including the swallowed-fault counts.
pub async fn cache_health(cache: web::Data<CacheLayer>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(json!({
        "enabled": cache.is_enabled(),
        "listTtlSecs": cache.policy().list_ttl().as_secs(),
        "defaultTtlSecs": cache.policy().default_ttl().as_secs(),
        "stats": cache.stats().snapshot(),
    }))))
}
