use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use crate::domain::error::DomainError;

/// Accepts a binary payload and returns a durable, publicly fetchable
/// URL for it.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError>;
}

/// Object key for an uploaded file: upload time in unix milliseconds
/// plus the original name with whitespace flattened to underscores.
pub fn object_key(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), safe)
}

/// Uploads to an S3-style HTTP object store with a single authenticated
/// PUT per object.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
    public_url: String,
    token: Option<String>,
}

impl HttpObjectStorage {
    pub fn new(base_url: &str, public_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        let mut req = self
            .client
            .put(format!("{}/{}", self.base_url, key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| {
            error!("object store unreachable: {}", e);
            DomainError::Storage(e.to_string())
        })?;

        if !resp.status().is_success() {
            error!(status = resp.status().as_u16(), key, "object store rejected upload");
            return Err(DomainError::Storage(format!(
                "object store returned {}",
                resp.status()
            )));
        }

        info!(key, "object uploaded");
        Ok(format!("{}/{}", self.public_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::object_key;

    #[test]
    fn object_key_flattens_whitespace_and_prefixes_a_timestamp() {
        let key = object_key("my holiday photo.png");
        let (millis, name) = key.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(name, "my_holiday_photo.png");
    }
}
