use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};

use crate::domain::error::DomainError;
use crate::domain::user::Principal;
use crate::infrastructure::identity::IdentityVerifier;

/// The verified caller on routes that require authentication. Missing
/// or invalid credentials reject the request before the handler runs.
#[derive(Debug, Clone)]
pub struct Identity(pub Principal);

/// The caller on routes where authentication is optional. A missing
/// header means anonymous; a header that fails verification is still an
/// error rather than silent anonymity.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Principal>);

fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, DomainError> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(Some)
        .ok_or(DomainError::Unauthenticated)
}

fn verify(req: &HttpRequest, token: &str) -> Result<Principal, Error> {
    let verifier = req
        .app_data::<web::Data<IdentityVerifier>>()
        .ok_or_else(|| {
            actix_web::error::ErrorInternalServerError("identity verifier not configured")
        })?;
    verifier.verify(token).map_err(Error::from)
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match bearer_token(req) {
            Ok(Some(token)) => verify(req, token).map(Identity),
            Ok(None) => Err(DomainError::Unauthenticated.into()),
            Err(e) => Err(e.into()),
        };
        ready(result)
    }
}

impl FromRequest for MaybeIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match bearer_token(req) {
            Ok(Some(token)) => verify(req, token).map(|p| MaybeIdentity(Some(p))),
            Ok(None) => Ok(MaybeIdentity(None)),
            Err(e) => Err(e.into()),
        };
        ready(result)
    }
}
