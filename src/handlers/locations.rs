use actix_web::{HttpResponse, Result, web};

use crate::{
    cache::CacheInvalidator,
    error::AppError,
    handlers::shared::ApiResponse,
    services::{LocationError, LocationService},
};

fn wilaya_not_found(query: &str) -> AppError {
    AppError::NotFound(format!("Wilaya '{}' not found", query))
}

pub async fn list_wilayas(locations: web::Data<LocationService>) -> Result<HttpResponse> {
    let directory = locations.current();
    Ok(HttpResponse::Ok().json(ApiResponse::success(directory.summaries())))
}

pub async fn get_wilaya(
    locations: web::Data<LocationService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let query = path.into_inner();
    let directory = locations.current();
    let wilaya = directory
        .find_wilaya(&query)
        .ok_or_else(|| wilaya_not_found(&query))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(wilaya)))
}

pub async fn list_dairas(
    locations: web::Data<LocationService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let query = path.into_inner();
    let directory = locations.current();
    let dairas = directory
        .dairas_of(&query)
        .ok_or_else(|| wilaya_not_found(&query))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(dairas)))
}

pub async fn list_communes(
    locations: web::Data<LocationService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (wilaya, daira) = path.into_inner();
    let directory = locations.current();
    let communes = directory.communes_of(&wilaya, &daira).ok_or_else(|| {
        AppError::NotFound(format!("Daira '{}' not found in wilaya '{}'", daira, wilaya))
    })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(communes)))
}

pub async fn reload_locations(
    locations: web::Data<LocationService>,
    cache: web::Data<CacheInvalidator>,
) -> Result<HttpResponse> {
    let count = locations.reload().await.map_err(|e| match e {
        LocationError::NotConfigured => {
            AppError::BadRequest("No location dataset configured".to_string())
        }
        other => {
            log::error!("Failed to reload locations: {}", other);
            AppError::internal_server_error_message(other.to_string())
        }
    })?;
    cache.invalidate_locations().await;
    // property lists resolve `?wilaya=<name>` through the dataset
    cache.invalidate_properties().await;

    log::info!("Reloaded location dataset: {} wilayas", count);
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        Some(count),
        "Location dataset reloaded",
    )))
}
