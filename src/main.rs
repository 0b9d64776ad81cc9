use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use immo_api::database::{
    init_database,
    repositories::{BlogRepository, PropertyRepository, UserRepository},
};
use immo_api::middleware::ResponseCacheMiddleware;
use immo_api::services::{IconCatalog, LocationService};
use immo_api::{CacheLayer, CachePolicy, Config, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Immo API v1.0")
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "Starting Immo API (environment: {})",
        config.environment
    );

    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    let locations = LocationService::from_source(config.locations_dataset.as_deref())?;

    let policy = CachePolicy::from_config(&config.cache).with_rules(routes::cache_rules());
    let cache = CacheLayer::from_config(&config.cache, policy);
    log::info!(
        "Response cache {} (list ttl {:?}, default ttl {:?}, capacity {})",
        if cache.is_enabled() { "enabled" } else { "disabled" },
        config.cache.list_ttl,
        config.cache.default_ttl,
        config.cache.max_capacity
    );

    let property_repo_data = web::Data::new(PropertyRepository::new(pool.clone()));
    let blog_repo_data = web::Data::new(BlogRepository::new(pool.clone()));
    let user_repo_data = web::Data::new(UserRepository::new(pool.clone()));
    let locations_data = web::Data::new(locations);
    let icons_data = web::Data::new(IconCatalog::default());
    let invalidator_data = web::Data::new(cache.invalidator());
    let cache_data = web::Data::new(cache.clone());
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    let allowed_origin = config.client_base_url.clone();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(property_repo_data.clone())
            .app_data(blog_repo_data.clone())
            .app_data(user_repo_data.clone())
            .app_data(locations_data.clone())
            .app_data(icons_data.clone())
            .app_data(invalidator_data.clone())
            .app_data(cache_data.clone())
            .wrap(ResponseCacheMiddleware::new(cache.clone()))
            .wrap(
                Cors::default()
                    .allowed_origin(&allowed_origin)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
                    .max_age(3600),
            )
            .wrap(Logger::new(r#"%a "%r" %s %b "%{User-Agent}i" %T"#))
            .service(hello)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
