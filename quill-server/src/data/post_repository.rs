use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostChanges, PostWithAuthor};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    /// Returns the post only if it is published or authored by `principal`.
    /// A miss and a hidden draft are indistinguishable to the caller.
    async fn find_visible(
        &self,
        id: Uuid,
        principal: Option<&str>,
    ) -> Result<Option<PostWithAuthor>, DomainError>;
    async fn list_published(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<PostWithAuthor>, DomainError>;
    async fn update_owned(
        &self,
        id: Uuid,
        principal: &str,
        changes: PostChanges,
    ) -> Result<PostWithAuthor, DomainError>;
    async fn delete_owned(&self, id: Uuid, principal: &str) -> Result<(), DomainError>;
}

const POST_COLUMNS: &str = "posts.id, posts.author_id, posts.title, posts.content, \
     posts.video_url, posts.image_url, posts.published, posts.created_at, posts.updated_at, \
     users.name AS author_name, users.email AS author_email";

/// Escapes `%`, `_` and `\` so a search filter matches literally inside
/// an ILIKE pattern.
pub fn escape_like(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len());
    for c in filter.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Narrows a zero-row conditional write: the row exists but belongs to
    /// someone else, or it does not exist at all.
    async fn narrow_missing(&self, id: Uuid) -> DomainError {
        let exists: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await;
        match exists {
            Ok(true) => DomainError::Forbidden,
            Ok(false) => DomainError::NotFound(id),
            Err(e) => {
                error!("db error probing post {}: {}", id, e);
                DomainError::Upstream(e.to_string())
            }
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, content, video_url, image_url,
                               published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.video_url)
        .bind(&post.image_url)
        .bind(post.published)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Upstream(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_visible(
        &self,
        id: Uuid,
        principal: Option<&str>,
    ) -> Result<Option<PostWithAuthor>, DomainError> {
        // With no principal the second disjunct compares against NULL and
        // never matches, so anonymous callers only see published posts.
        sqlx::query_as::<_, PostWithAuthor>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts JOIN users ON users.id = posts.author_id
            WHERE posts.id = $1 AND (posts.published = TRUE OR users.external_id = $2)
            "#,
        ))
        .bind(id)
        .bind(principal)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_visible {}: {}", id, e);
            DomainError::Upstream(e.to_string())
        })
    }

    async fn list_published(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<PostWithAuthor>, DomainError> {
        let pattern = filter.map(|f| format!("%{}%", escape_like(f)));

        sqlx::query_as::<_, PostWithAuthor>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts JOIN users ON users.id = posts.author_id
            WHERE posts.published = TRUE
              AND ($1::text IS NULL
                   OR posts.title ILIKE $1 ESCAPE '\'
                   OR posts.content ILIKE $1 ESCAPE '\')
            ORDER BY posts.created_at DESC
            "#,
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while listing posts: {}", e);
            DomainError::Upstream(e.to_string())
        })
    }

    async fn update_owned(
        &self,
        id: Uuid,
        principal: &str,
        changes: PostChanges,
    ) -> Result<PostWithAuthor, DomainError> {
        let now = Utc::now();
        // The ownership check lives in the WHERE clause so check and write
        // are one atomic statement.
        let post = sqlx::query_as::<_, PostWithAuthor>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($3, posts.title),
                content = COALESCE($4, posts.content),
                published = COALESCE($5, posts.published),
                video_url = CASE WHEN $6 THEN $7 ELSE posts.video_url END,
                image_url = CASE WHEN $8 THEN $9 ELSE posts.image_url END,
                updated_at = $10
            FROM users
            WHERE posts.id = $1 AND posts.author_id = users.id AND users.external_id = $2
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(principal)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(changes.published)
        .bind(changes.video_url.is_some())
        .bind(changes.video_url.as_ref().and_then(|v| v.as_deref()))
        .bind(changes.image_url.is_some())
        .bind(changes.image_url.as_ref().and_then(|v| v.as_deref()))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Upstream(e.to_string())
        })?;

        match post {
            Some(post) => {
                info!(post_id = %id, "post updated");
                Ok(post)
            }
            None => Err(self.narrow_missing(id).await),
        }
    }

    async fn delete_owned(&self, id: Uuid, principal: &str) -> Result<(), DomainError> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM posts USING users
            WHERE posts.id = $1 AND posts.author_id = users.id AND users.external_id = $2
            "#,
        )
        .bind(id)
        .bind(principal)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to delete post {}: {}", id, e);
            DomainError::Upstream(e.to_string())
        })?;

        if deleted.rows_affected() == 0 {
            return Err(self.narrow_missing(id).await);
        }

        info!(post_id = %id, "post deleted");
        Ok(())
    }
}
