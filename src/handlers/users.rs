use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::{
    cache::CacheInvalidator,
    database::{
        models::{CreateUserRequest, UpdateUserRequest},
        repositories::UserRepository,
    },
    error::AppError,
    handlers::shared::{ApiResponse, PageQuery, Paginated},
};

pub async fn list_users(
    repo: web::Data<UserRepository>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (users, total) = repo
        .list(i64::from(query.limit()), query.offset())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(Paginated::new(
        users,
        query.page(),
        query.limit(),
        total,
    ))))
}

pub async fn get_user(
    repo: web::Data<UserRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = repo
        .find_by_id(path.into_inner())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

pub async fn create_user(
    repo: web::Data<UserRepository>,
    cache: web::Data<CacheInvalidator>,
    input: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    let request = input.into_inner();
    request.validate().map_err(AppError::BadRequest)?;

    let password = request.password.clone();
    let password_hash = web::block(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::internal_server_error_message(e.to_string()))?
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::internal_server_error_message("Failed to hash password")
        })?;

    let user = repo
        .create(request, password_hash)
        .await
        .map_err(AppError::from)?;
    cache.invalidate_users().await;

    Ok(HttpResponse::Created().json(ApiResponse::success(user)))
}

pub async fn update_user(
    repo: web::Data<UserRepository>,
    cache: web::Data<CacheInvalidator>,
    path: web::Path<Uuid>,
    input: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let user = repo
        .update(path.into_inner(), input.into_inner())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    cache.invalidate_users().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

pub async fn delete_user(
    repo: web::Data<UserRepository>,
    cache: web::Data<CacheInvalidator>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if !repo.delete(path.into_inner()).await.map_err(AppError::from)? {
        return Err(AppError::NotFound("User not found".to_string()).into());
    }
    cache.invalidate_users().await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "User deleted successfully",
    )))
}
