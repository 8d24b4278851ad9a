use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::user::Principal;

/// Claims carried by the identity provider's HS256 bearer tokens. `sub`
/// is the opaque principal id; the profile claims are optional.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Verifies tokens issued by the external identity provider. This
/// service never mints tokens itself.
#[derive(Clone)]
pub struct IdentityVerifier {
    secret: String,
}

impl IdentityVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn verify(&self, token: &str) -> Result<Principal, DomainError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| DomainError::Unauthenticated)?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(DomainError::Unauthenticated);
        }
        Ok(Principal {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, sub: &str) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: sub.to_string(),
            name: Some("Ada".to_string()),
            email: None,
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn verifies_a_well_formed_token() {
        let verifier = IdentityVerifier::new("s3cret".into());
        let principal = verifier.verify(&token("s3cret", "u1")).unwrap();
        assert_eq!(principal.id, "u1");
        assert_eq!(principal.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn rejects_wrong_secret_and_blank_subject() {
        let verifier = IdentityVerifier::new("s3cret".into());
        assert!(verifier.verify(&token("other", "u1")).is_err());
        assert!(verifier.verify(&token("s3cret", "  ")).is_err());
    }
}
