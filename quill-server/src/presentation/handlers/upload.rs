use std::sync::Arc;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::info;

use crate::domain::error::DomainError;
use crate::infrastructure::storage::{ObjectStorage, object_key};
use crate::presentation::dto::{UploadQuery, UploadResponse};
use crate::presentation::extract::Identity;
use crate::presentation::handlers::post::request_id;

#[post("/uploads")]
async fn upload_image(
    req: HttpRequest,
    identity: Identity,
    storage: web::Data<Arc<dyn ObjectStorage>>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, DomainError> {
    if query.filename.trim().is_empty() {
        return Err(DomainError::EmptyField("filename"));
    }
    if body.is_empty() {
        return Err(DomainError::InvalidInput("empty upload body".into()));
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let key = object_key(&query.filename);
    let image_url = storage.put(&key, content_type, body.to_vec()).await?;

    info!(
        request_id = %request_id(&req),
        principal = %identity.0.id,
        key = %key,
        "image uploaded"
    );

    Ok(HttpResponse::Created().json(UploadResponse { image_url }))
}
