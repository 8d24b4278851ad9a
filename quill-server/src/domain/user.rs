use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(external_id: String, name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id,
            name,
            email,
            created_at: Utc::now(),
        }
    }
}

/// The authenticated caller as resolved from a verified identity token:
/// the opaque identifier the provider issued, plus whatever profile
/// claims came along with it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}
