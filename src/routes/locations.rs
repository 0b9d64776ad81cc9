use actix_web::web;

use crate::handlers::locations;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/locations")
            .route("/wilayas", web::get().to(locations::list_wilayas))
            .route("/wilayas/{code}", web::get().to(locations::get_wilaya))
            .route("/wilayas/{code}/dairas", web::get().to(locations::list_dairas))
            .route(
                "/wilayas/{code}/dairas/{daira}/communes",
                web::get().to(locations::list_communes),
            )
            .route("/reload", web::post().to(locations::reload_locations)),
    );
}
