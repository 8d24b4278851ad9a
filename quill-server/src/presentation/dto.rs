use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::domain::post::PostWithAuthor;

// ======================= Requests =======================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update. For the URL fields an absent key means "preserve",
/// an explicit `null` means "clear"; `double_option` keeps the two
/// distinguishable after deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub video_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

// ======================= Responses =======================

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostWithAuthor> for PostResponse {
    fn from(row: PostWithAuthor) -> Self {
        Self {
            id: row.post.id,
            title: row.post.title,
            content: row.post.content,
            video_url: row.post.video_url,
            image_url: row.post.image_url,
            published: row.post.published,
            author_id: row.post.author_id,
            author: AuthorResponse {
                name: row.author_name,
                email: row.author_email,
            },
            created_at: row.post.created_at,
            updated_at: row.post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}
