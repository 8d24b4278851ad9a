use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::application::directory::DirectoryService;
use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostChanges, PostWithAuthor};
use crate::domain::user::Principal;
use crate::infrastructure::sanitize::HtmlSanitizer;
use crate::presentation::dto::{CreatePostRequest, UpdatePostRequest};

/// Mediates every read and write of posts: ownership enforcement,
/// input validation, and content hygiene. The only writer of the
/// content store.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    directory: DirectoryService,
    sanitizer: HtmlSanitizer,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        directory: DirectoryService,
        sanitizer: HtmlSanitizer,
    ) -> Self {
        Self {
            posts,
            directory,
            sanitizer,
        }
    }

    pub async fn list_published(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<PostWithAuthor>, DomainError> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        self.posts.list_published(filter).await
    }

    pub async fn get(
        &self,
        id: Uuid,
        principal: Option<&Principal>,
    ) -> Result<PostWithAuthor, DomainError> {
        self.posts
            .find_visible(id, principal.map(|p| p.id.as_str()))
            .await?
            .ok_or(DomainError::NotFound(id))
    }

    #[instrument(skip(self, payload))]
    pub async fn create(
        &self,
        principal: &Principal,
        payload: CreatePostRequest,
    ) -> Result<PostWithAuthor, DomainError> {
        if payload.title.trim().is_empty() {
            return Err(DomainError::EmptyField("title"));
        }
        if payload.content.trim().is_empty() {
            return Err(DomainError::EmptyField("content"));
        }

        let author = self.directory.resolve_or_create(principal).await?;
        let content = self.sanitizer.clean(&payload.content);

        let post = Post::new(
            author.id,
            payload.title,
            content,
            normalize_url(payload.video_url),
            normalize_url(payload.image_url),
            payload.published.unwrap_or(true),
        );
        let post = self.posts.create(post).await?;

        Ok(PostWithAuthor {
            post,
            author_name: author.name,
            author_email: author.email,
        })
    }

    #[instrument(skip(self, payload))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: UpdatePostRequest,
    ) -> Result<PostWithAuthor, DomainError> {
        if let Some(title) = &payload.title {
            if title.trim().is_empty() {
                return Err(DomainError::EmptyField("title"));
            }
        }
        if let Some(content) = &payload.content {
            if content.trim().is_empty() {
                return Err(DomainError::EmptyField("content"));
            }
        }

        let changes = PostChanges {
            title: payload.title,
            content: payload.content.map(|c| self.sanitizer.clean(&c)),
            published: payload.published,
            video_url: payload.video_url.map(normalize_url),
            image_url: payload.image_url.map(normalize_url),
        };

        self.posts.update_owned(id, &principal.id, changes).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        self.posts.delete_owned(id, &principal.id).await
    }
}

// Empty and whitespace-only URLs are stored as NULL, never as "".
fn normalize_url(url: Option<String>) -> Option<String> {
    url.filter(|u| !u.trim().is_empty())
}
