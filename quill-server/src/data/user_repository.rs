use crate::domain::error::DomainError;
use crate::domain::user::User;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user unless a row for its external id already exists,
    /// then returns whichever row won. Concurrent first-writes for the
    /// same principal resolve to a single row.
    async fn upsert_by_external_id(&self, user: User) -> Result<User, DomainError>;
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn upsert_by_external_id(&self, user: User) -> Result<User, DomainError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, external_id, name, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.external_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create user: {}", e);
            DomainError::Upstream(format!("database error: {}", e))
        })?;

        if inserted.rows_affected() > 0 {
            info!(user_id = %user.id, external_id = %user.external_id, "user created");
            return Ok(user);
        }

        // Lost the insert race (or the row predates this call); the
        // re-select observes the winner.
        self.find_by_external_id(&user.external_id)
            .await?
            .ok_or_else(|| {
                DomainError::Upstream(format!(
                    "user row vanished after conflicting insert: {}",
                    user.external_id
                ))
            })
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, name, email, created_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find user by external id {}: {}", external_id, e);
            DomainError::Upstream(format!("database error: {}", e))
        })
    }
}
