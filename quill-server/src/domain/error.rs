use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("post not found: {0}")]
    NotFound(Uuid),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("object storage failure: {0}")]
    Storage(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::EmptyField(_) | DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Storage(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Upstream detail is logged, never sent to the caller.
        let (message, details) = match self {
            DomainError::NotFound(resource) => {
                (self.to_string(), Some(json!({ "resource": resource })))
            }
            DomainError::Forbidden => (
                self.to_string(),
                Some(json!({ "message": "you are not the author of this post" })),
            ),
            DomainError::EmptyField(field) => (self.to_string(), Some(json!({ "field": field }))),
            DomainError::Upstream(detail) => {
                error!("upstream failure: {}", detail);
                ("internal server error".to_string(), None)
            }
            DomainError::Storage(detail) => {
                error!("object storage failure: {}", detail);
                ("image upload failed".to_string(), None)
            }
            _ => (self.to_string(), None),
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
