//! Reqwest-backed place resolver.
//!
//! This adapter owns transport details only. Every failure is logged and
//! reported to the caller as [`PlaceRef::Manual`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::dto::{SearchTextRequestDto, SearchTextResponseDto};
use crate::domain::ports::PlaceResolver;
use crate::domain::{Coordinate, PlaceRef};

/// Default public `searchText` endpoint.
pub const DEFAULT_PLACES_ENDPOINT: &str = "https://places.googleapis.com/v1/places:searchText";
const FIELD_MASK: &str = "places.id";

/// Failures inside a single lookup. Never leaves this module.
#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("places request timed out: {0}")]
    Timeout(String),
    #[error("places transport failed: {0}")]
    Transport(String),
    #[error("places answered status {0}")]
    Status(u16),
    #[error("places payload undecodable: {0}")]
    Decode(String),
    #[error("places returned no match")]
    NoMatch,
}

/// Place resolver calling the Places `searchText` endpoint.
pub struct HttpPlaceResolver {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl HttpPlaceResolver {
    /// Build a resolver with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: Zeroizing::new(api_key),
        })
    }

    async fn lookup(&self, text: &str, near: &Coordinate) -> Result<String, LookupError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Goog-Api-Key", self.api_key.as_str())
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&SearchTextRequestDto::new(text, near))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status));
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        parse_place_id(body.as_ref())
    }
}

#[async_trait]
impl PlaceResolver for HttpPlaceResolver {
    async fn resolve(&self, text: &str, near: &Coordinate) -> PlaceRef {
        match self.lookup(text, near).await {
            Ok(id) => {
                debug!(place_id = %id, "place resolved");
                PlaceRef::Resolved(id)
            }
            Err(LookupError::NoMatch) => {
                debug!("no place matched; storing manual reference");
                PlaceRef::Manual
            }
            Err(error) => {
                warn!(%error, "place resolution failed; storing manual reference");
                PlaceRef::Manual
            }
        }
    }
}

fn parse_place_id(body: &[u8]) -> Result<String, LookupError> {
    let decoded: SearchTextResponseDto =
        serde_json::from_slice(body).map_err(|error| LookupError::Decode(error.to_string()))?;
    decoded.first_place_id().ok_or(LookupError::NoMatch)
}

fn map_transport_error(error: reqwest::Error) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout(error.to_string())
    } else {
        LookupError::Transport(error.to_string())
    }
}

fn map_status(status: StatusCode) -> LookupError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            LookupError::Timeout(format!("status {}", status.as_u16()))
        }
        other => LookupError::Status(other.as_u16()),
    }
}
