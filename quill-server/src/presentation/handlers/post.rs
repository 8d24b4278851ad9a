use actix_web::{HttpMessage, HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{
    CreatePostRequest, ListPostsQuery, PostResponse, UpdatePostRequest,
};
use crate::presentation::extract::{Identity, MaybeIdentity};

#[get("/posts")]
async fn list_posts(
    service: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.list_published(query.q.as_deref()).await?;
    let response: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[get("/posts/{id}")]
async fn get_post(
    identity: MaybeIdentity,
    service: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = service.get(path.into_inner(), identity.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    identity: Identity,
    service: web::Data<PostService>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = service.create(&identity.0, payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        principal = %identity.0.id,
        post_id = %post.post.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

#[put("/posts/{id}")]
async fn update_post(
    req: HttpRequest,
    identity: Identity,
    service: web::Data<PostService>,
    payload: web::Json<UpdatePostRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = service
        .update(&identity.0, post_id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        principal = %identity.0.id,
        post_id = %post_id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

#[delete("/posts/{id}")]
async fn delete_post(
    req: HttpRequest,
    identity: Identity,
    service: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    service.delete(&identity.0, post_id).await?;

    info!(
        request_id = %request_id(&req),
        principal = %identity.0.id,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}

pub(crate) fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<crate::presentation::telemetry::RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
