//! Port for verifying bearer tokens issued by the external identity service.

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Reasons a bearer token is refused.
    pub enum AccessTokenError {
        /// Signature, structure, or algorithm check failed.
        Invalid { message: String } => "access token rejected: {message}",
        Expired => "access token expired",
        /// The `sub` claim is not a user identifier.
        Subject => "access token subject is not a user id",
    }
}

/// Maps a raw bearer token to the caller's identity.
pub trait AccessTokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, AccessTokenError>;
}
