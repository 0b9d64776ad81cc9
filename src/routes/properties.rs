use actix_web::web;

use crate::handlers::properties;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .route("", web::get().to(properties::list_properties))
            .route("", web::post().to(properties::create_property))
            // before "/{id}" so it is not parsed as an id
            .route("/random", web::get().to(properties::random_properties))
            .route("/{id}", web::get().to(properties::get_property))
            .route("/{id}", web::put().to(properties::update_property))
            .route("/{id}", web::delete().to(properties::delete_property)),
    );
}
