//! Domain ports for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are what inbound adapters call.
//! Driven ports (`*Repository`, `PlaceResolver`, `AccessTokenVerifier`) are
//! what outbound adapters implement.

mod macros;
pub(crate) use macros::define_port_error;

mod access_token_verifier;
mod linkup_command;
mod linkup_query;
mod linkup_repository;
mod place_resolver;
mod user_location_command;
mod user_location_repository;

pub use access_token_verifier::{AccessTokenError, AccessTokenVerifier};
#[cfg(test)]
pub use linkup_command::MockLinkupCommand;
pub use linkup_command::{
    CancelLinkupRequest, CreateLinkupRequest, CreateLinkupResponse, JoinLinkupRequest,
    LinkupCommand,
};
#[cfg(test)]
pub use linkup_query::MockLinkupQuery;
pub use linkup_query::{LinkupQuery, ListNearbyRequest};
#[cfg(test)]
pub use linkup_repository::MockLinkupRepository;
pub use linkup_repository::{
    CancelOutcome, ClaimOutcome, FixtureLinkupRepository, InvitationInsert, LinkupRepository,
    LinkupRepositoryError,
};
#[cfg(test)]
pub use place_resolver::MockPlaceResolver;
pub use place_resolver::{FixturePlaceResolver, PlaceResolver};
#[cfg(test)]
pub use user_location_command::MockUserLocationCommand;
pub use user_location_command::UserLocationCommand;
#[cfg(test)]
pub use user_location_repository::MockUserLocationRepository;
pub use user_location_repository::{UserLocationRepository, UserLocationRepositoryError};
