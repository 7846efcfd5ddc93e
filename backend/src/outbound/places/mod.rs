//! Places outbound adapter.
//!
//! Thin HTTP implementation of the `PlaceResolver` port.

mod dto;
mod http_resolver;

pub use http_resolver::{DEFAULT_PLACES_ENDPOINT, HttpPlaceResolver};
