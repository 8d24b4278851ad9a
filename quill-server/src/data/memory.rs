//! In-memory repositories backed by async locks. Drop-in stand-ins for
//! the Postgres implementations in tests and local development; data is
//! lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostChanges, PostWithAuthor};
use crate::domain::user::User;

#[derive(Default)]
pub struct InMemoryUserRepository {
    // Keyed by external id, the lookup every caller performs.
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        let users = self.users.read().await;
        users.values().find(|u| u.id == id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_by_external_id(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let row = users.entry(user.external_id.clone()).or_insert(user);
        Ok(row.clone())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(external_id).cloned())
    }
}

pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryPostRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            users,
        }
    }

    async fn author_of(&self, post: &Post) -> Result<User, DomainError> {
        self.users.find_by_id(post.author_id).await.ok_or_else(|| {
            DomainError::Upstream(format!("author missing for post {}", post.id))
        })
    }

    async fn with_author(&self, post: Post) -> Result<PostWithAuthor, DomainError> {
        let author = self.author_of(&post).await?;
        Ok(PostWithAuthor {
            post,
            author_name: author.name,
            author_email: author.email,
        })
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let mut posts = self.posts.write().await;
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_visible(
        &self,
        id: Uuid,
        principal: Option<&str>,
    ) -> Result<Option<PostWithAuthor>, DomainError> {
        let post = {
            let posts = self.posts.read().await;
            posts.get(&id).cloned()
        };
        let Some(post) = post else {
            return Ok(None);
        };
        let author = self.author_of(&post).await?;
        if !post.published && principal != Some(author.external_id.as_str()) {
            return Ok(None);
        }
        Ok(Some(PostWithAuthor {
            post,
            author_name: author.name,
            author_email: author.email,
        }))
    }

    async fn list_published(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<PostWithAuthor>, DomainError> {
        let needle = filter.map(|f| f.to_lowercase());
        let mut matched: Vec<Post> = {
            let posts = self.posts.read().await;
            posts
                .values()
                .filter(|p| p.published)
                .filter(|p| match &needle {
                    Some(n) => {
                        p.title.to_lowercase().contains(n) || p.content.to_lowercase().contains(n)
                    }
                    None => true,
                })
                .cloned()
                .collect()
        };
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut out = Vec::with_capacity(matched.len());
        for post in matched {
            out.push(self.with_author(post).await?);
        }
        Ok(out)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        principal: &str,
        changes: PostChanges,
    ) -> Result<PostWithAuthor, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Err(DomainError::NotFound(id));
        };
        let author = self
            .users
            .find_by_id(post.author_id)
            .await
            .ok_or_else(|| DomainError::Upstream(format!("author missing for post {}", id)))?;
        if author.external_id != principal {
            return Err(DomainError::Forbidden);
        }

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(published) = changes.published {
            post.published = published;
        }
        if let Some(video_url) = changes.video_url {
            post.video_url = video_url;
        }
        if let Some(image_url) = changes.image_url {
            post.image_url = image_url;
        }
        post.updated_at = Utc::now();

        Ok(PostWithAuthor {
            post: post.clone(),
            author_name: author.name,
            author_email: author.email,
        })
    }

    async fn delete_owned(&self, id: Uuid, principal: &str) -> Result<(), DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get(&id) else {
            return Err(DomainError::NotFound(id));
        };
        let author = self
            .users
            .find_by_id(post.author_id)
            .await
            .ok_or_else(|| DomainError::Upstream(format!("author missing for post {}", id)))?;
        if author.external_id != principal {
            return Err(DomainError::Forbidden);
        }
        posts.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_is_idempotent_per_external_id() {
        let repo = InMemoryUserRepository::new();
        let first = repo
            .upsert_by_external_id(User::new("u1".into(), "One".into(), "one@a.test".into()))
            .await
            .unwrap();
        let second = repo
            .upsert_by_external_id(User::new("u1".into(), "Other".into(), "other@a.test".into()))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn delete_by_non_author_is_forbidden() {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = InMemoryPostRepository::new(Arc::clone(&users));
        let author = users
            .upsert_by_external_id(User::new("u1".into(), "One".into(), "one@a.test".into()))
            .await
            .unwrap();
        let post = posts
            .create(Post::new(author.id, "T".into(), "C".into(), None, None, true))
            .await
            .unwrap();

        let err = posts.delete_owned(post.id, "u2").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        assert!(posts.find_visible(post.id, None).await.unwrap().is_some());
    }
}
