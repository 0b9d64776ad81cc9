use actix_web::web;

use crate::handlers::blog;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blog")
            .route("", web::get().to(blog::list_posts))
            .route("", web::post().to(blog::create_post))
            .route("/{slug}", web::get().to(blog::get_post))
            .route("/{id}", web::put().to(blog::update_post))
            .route("/{id}", web::delete().to(blog::delete_post)),
    );
}
