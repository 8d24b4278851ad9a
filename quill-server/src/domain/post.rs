use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        video_url: Option<String>,
        image_url: Option<String>,
        published: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            video_url,
            image_url,
            published,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A post joined with its author's display metadata, the shape every
/// read path returns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithAuthor {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_name: String,
    pub author_email: String,
}

/// Field-level changes for an update. The double `Option` on the URL
/// fields distinguishes "leave untouched" (`None`) from "clear"
/// (`Some(None)`) and "set" (`Some(Some(value))`).
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub video_url: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}
