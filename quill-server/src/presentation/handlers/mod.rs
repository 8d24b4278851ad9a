pub mod post;
pub mod upload;

use actix_web::{Scope, web};

pub fn api_scope() -> Scope {
    web::scope("/api")
        .service(post::list_posts)
        .service(post::get_post)
        .service(post::create_post)
        .service(post::update_post)
        .service(post::delete_post)
        .service(upload::upload_image)
}
