use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::{
    cache::CacheInvalidator,
    database::{
        models::{BlogPostInput, BlogQuery},
        repositories::BlogRepository,
    },
    error::AppError,
    handlers::shared::{ApiResponse, PageQuery, Paginated},
};

pub async fn list_posts(
    repo: web::Data<BlogRepository>,
    query: web::Query<BlogQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let (posts, total) = repo
        .list(query.include_drafts, i64::from(page.limit()), page.offset())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(Paginated::new(
        posts,
        page.page(),
        page.limit(),
        total,
    ))))
}

pub async fn get_post(
    repo: web::Data<BlogRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let post = repo
        .find_published_by_slug(&slug)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Blog post '{}' not found", slug)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(post)))
}

pub async fn create_post(
    repo: web::Data<BlogRepository>,
    cache: web::Data<CacheInvalidator>,
    input: web::Json<BlogPostInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate().map_err(AppError::BadRequest)?;

    let post = repo.create(input).await.map_err(AppError::from)?;
    cache.invalidate_blog().await;

    Ok(HttpResponse::Created().json(ApiResponse::success(post)))
}

pub async fn update_post(
    repo: web::Data<BlogRepository>,
    cache: web::Data<CacheInvalidator>,
    path: web::Path<Uuid>,
    input: web::Json<BlogPostInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = input.into_inner();
    input.validate().map_err(AppError::BadRequest)?;

    let post = repo
        .update(id, input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))?;
    cache.invalidate_blog().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(post)))
}

pub async fn delete_post(
    repo: web::Data<BlogRepository>,
    cache: web::Data<CacheInvalidator>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if !repo.delete(path.into_inner()).await.map_err(AppError::from)? {
        return Err(AppError::NotFound("Blog post not found".to_string()).into());
    }
    cache.invalidate_blog().await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Blog post deleted successfully",
    )))
}
