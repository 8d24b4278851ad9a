use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("invalid request: {0}")]
    InvalidInput(String),
    #[error("server error: status {0}")]
    Server(u16),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub async fn from_http_response(resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        match status {
            401 => ApiError::Unauthenticated,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            400 => {
                let message = resp
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_else(|_| "bad request".to_string());
                ApiError::InvalidInput(message)
            }
            _ => ApiError::Server(status),
        }
    }
}
