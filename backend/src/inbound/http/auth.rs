//! Bearer token extractor.
//!
//! Handlers take an [`AuthenticatedUser`] argument; the extractor reads the
//! `Authorization: Bearer <token>` header and asks the configured
//! [`AccessTokenVerifier`](crate::domain::ports::AccessTokenVerifier) for the
//! caller's identity.

use actix_web::dev::Payload;
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::ports::AccessTokenError;
use crate::domain::{Error, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Verified caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(UserId);

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.0
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = raw
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must be a bearer token"))?;
    Ok(token)
}

fn map_token_error(error: AccessTokenError) -> Error {
    debug!(%error, "bearer token refused");
    match error {
        AccessTokenError::Expired => Error::unauthorized("bearer token expired"),
        _ => Error::unauthorized("invalid bearer token"),
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("http state not registered"))?;
    let token = bearer_token(req.headers())?;
    state
        .tokens
        .verify(token)
        .map(AuthenticatedUser)
        .map_err(map_token_error)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
