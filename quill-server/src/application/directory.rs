use std::sync::Arc;

use tracing::instrument;

use crate::data::user_repository::UserRepository;
use crate::domain::{
    error::DomainError,
    user::{Principal, User},
};

/// Maps external principals to directory rows, creating one lazily on
/// first authenticated write.
#[derive(Clone)]
pub struct DirectoryService {
    repo: Arc<dyn UserRepository>,
}

impl DirectoryService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, external_id: &str) -> Result<Option<User>, DomainError> {
        self.repo.find_by_external_id(external_id).await
    }

    #[instrument(skip(self))]
    pub async fn resolve_or_create(&self, principal: &Principal) -> Result<User, DomainError> {
        if let Some(user) = self.repo.find_by_external_id(&principal.id).await? {
            return Ok(user);
        }
        let (name, email) = display_profile(principal);
        // The repository insert is conflict-handling, so losing a race
        // here still resolves to the single winning row.
        self.repo
            .upsert_by_external_id(User::new(principal.id.clone(), name, email))
            .await
    }
}

/// Display metadata for a first-seen principal. The token's profile
/// claims win; the fallbacks keep both fields non-empty.
fn display_profile(principal: &Principal) -> (String, String) {
    let claim_email = principal.email.clone().filter(|e| !e.trim().is_empty());

    // The local-part fallback only applies to a real claim email; the
    // synthetic address below would just echo the principal id.
    let name = principal
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            claim_email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let short: String = principal.id.chars().take(8).collect();
            format!("user-{}", short)
        });

    let email = claim_email.unwrap_or_else(|| format!("{}@example.invalid", principal.id));

    (name, email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: &str, name: Option<&str>, email: Option<&str>) -> Principal {
        Principal {
            id: id.to_string(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn profile_claims_win_when_present() {
        let (name, email) = display_profile(&principal("u1", Some("Ada"), Some("ada@a.test")));
        assert_eq!(name, "Ada");
        assert_eq!(email, "ada@a.test");
    }

    #[test]
    fn name_falls_back_to_email_local_part() {
        let (name, email) = display_profile(&principal("u1", None, Some("ada@a.test")));
        assert_eq!(name, "ada");
        assert_eq!(email, "ada@a.test");
    }

    #[test]
    fn blank_email_claim_is_treated_as_absent() {
        let (name, email) = display_profile(&principal("abcdef", None, Some("   ")));
        assert_eq!(name, "user-abcdef");
        assert_eq!(email, "abcdef@example.invalid");
    }

    #[test]
    fn bare_principal_gets_synthetic_profile() {
        let (name, email) = display_profile(&principal("principal-12345", None, None));
        assert_eq!(name, "user-principa");
        assert_eq!(email, "principal-12345@example.invalid");
    }
}
