use async_trait::async_trait;
use uuid::Uuid;

pub mod error;
pub mod form;
mod http_client;
pub mod model;

pub use error::ApiError;
pub use http_client::HttpPostApi;
pub use model::{Author, ImageFile, NewPost, Patch, Post, PostPatch};

/// The blog API as the client sees it: post CRUD plus the image upload
/// that backs the authoring form's two-phase attachment flow.
#[async_trait]
pub trait PostApi: Send + Sync {
    async fn list_posts(&self, query: Option<&str>) -> Result<Vec<Post>, ApiError>;
    async fn get_post(&self, id: Uuid) -> Result<Post, ApiError>;
    async fn create_post(&self, new: &NewPost) -> Result<Post, ApiError>;
    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> Result<Post, ApiError>;
    async fn delete_post(&self, id: Uuid) -> Result<(), ApiError>;
    /// Uploads the file and returns its durable public URL.
    async fn upload_image(&self, file: &ImageFile) -> Result<String, ApiError>;
}
