//! HS256 bearer token verification.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::domain::UserId;
use crate::domain::ports::{AccessTokenError, AccessTokenVerifier};

const LEEWAY_SECONDS: u64 = 30;

/// `exp` is checked by [`Validation`] against the raw payload.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies tokens signed with a shared secret and maps `sub` to a [`UserId`].
pub struct JwtAccessTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAccessTokenVerifier {
    /// Build a verifier over the shared HMAC secret.
    pub fn hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = LEEWAY_SECONDS;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl AccessTokenVerifier for JwtAccessTokenVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AccessTokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AccessTokenError::expired(),
                _ => AccessTokenError::invalid(err.to_string()),
            }
        })?;
        UserId::parse(&data.claims.sub).map_err(|_| AccessTokenError::subject())
    }
}
