use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub published: Option<bool>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
}

/// One field of a partial update: leave it alone, clear it, or set it.
/// `Keep` means the key is left off the wire entirely, which the server
/// reads as "preserve the stored value".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub video_url: Patch<String>,
    pub image_url: Patch<String>,
}

/// A locally selected, not yet uploaded image.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
