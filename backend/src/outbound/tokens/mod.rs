//! Bearer token adapters.

mod jwt_verifier;

pub use jwt_verifier::JwtAccessTokenVerifier;
