use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::{
    cache::CacheInvalidator,
    database::{
        models::{PropertyDetail, PropertyFilters, PropertyInput},
        repositories::PropertyRepository,
    },
    error::AppError,
    handlers::shared::{ApiResponse, Paginated},
    services::{IconCatalog, LocationService},
};

const RANDOM_FEATURED_COUNT: i64 = 6;

pub async fn list_properties(
    repo: web::Data<PropertyRepository>,
    locations: web::Data<LocationService>,
    query: web::Query<PropertyFilters>,
) -> Result<HttpResponse> {
    let mut filters = query.into_inner();

    // Accept "Alger" or "16" alike; unknown names are matched verbatim.
    if let Some(wilaya) = filters.wilaya.take() {
        let code = locations
            .current()
            .find_wilaya(&wilaya)
            .map(|w| w.code.clone())
            .unwrap_or(wilaya);
        filters.wilaya = Some(code);
    }

    let (properties, total) = repo.list(&filters).await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(Paginated::new(
        properties,
        filters.page(),
        filters.limit(),
        total,
    ))))
}

pub async fn get_property(
    repo: web::Data<PropertyRepository>,
    icons: web::Data<IconCatalog>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let property = repo
        .find_by_id(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PropertyDetail::new(property, &icons))))
}

pub async fn random_properties(repo: web::Data<PropertyRepository>) -> Result<HttpResponse> {
    let properties = repo
        .random_featured(RANDOM_FEATURED_COUNT)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(properties)))
}

pub async fn create_property(
    repo: web::Data<PropertyRepository>,
    cache: web::Data<CacheInvalidator>,
    input: web::Json<PropertyInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate().map_err(AppError::BadRequest)?;

    let property = repo.create(input).await.map_err(|e| {
        log::error!("Failed to create property: {}", e);
        AppError::from(e)
    })?;
    cache.invalidate_properties().await;

    Ok(HttpResponse::Created().json(ApiResponse::success(property)))
}

pub async fn update_property(
    repo: web::Data<PropertyRepository>,
    cache: web::Data<CacheInvalidator>,
    path: web::Path<Uuid>,
    input: web::Json<PropertyInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = input.into_inner();
    input.validate().map_err(AppError::BadRequest)?;

    let property = repo
        .update(id, input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
    cache.invalidate_properties().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(property)))
}

pub async fn delete_property(
    repo: web::Data<PropertyRepository>,
    cache: web::Data<CacheInvalidator>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    if !repo.delete(id).await.map_err(AppError::from)? {
        return Err(AppError::NotFound("Property not found".to_string()).into());
    }
    cache.invalidate_properties().await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Property deleted successfully",
    )))
}
