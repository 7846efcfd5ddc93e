//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `LINKUP_*` environment variables, or a config
//! file. Numeric limits carry OrthoConfig defaults; accessors default and
//! validate the rest.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use rand::RngCore;
use reqwest::Url;
use serde::Deserialize;
use zeroize::Zeroizing;

use linkup_backend::outbound::places::DEFAULT_PLACES_ENDPOINT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const EPHEMERAL_SECRET_LEN: usize = 32;

/// Build mode used to decide how strictly secrets are enforced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Missing secrets are replaced by ephemeral ones.
    Debug,
    /// Missing secrets abort startup.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Errors raised while validating settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("invalid value for {name}='{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name} must be set in release builds")]
    Missing { name: &'static str },
}

/// HS256 secret for bearer tokens.
pub struct TokenSecret {
    bytes: Zeroizing<Vec<u8>>,
    ephemeral: bool,
}

impl TokenSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when the secret was generated at startup and tokens will not
    /// survive a restart.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }
}

/// Configuration values for the HTTP server and its adapters.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LINKUP")]
pub struct AppSettings {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the in-memory store is used.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Store budget per request, in milliseconds.
    #[ortho_config(default = 30_000)]
    pub request_timeout_ms: u64,
    /// HS256 secret used to verify bearer tokens.
    pub token_secret: Option<String>,
    /// Places API key. Without one every place resolves to `manual`.
    pub places_api_key: Option<String>,
    /// Places `searchText` endpoint override.
    pub places_endpoint: Option<String>,
    /// Places lookup budget, in milliseconds.
    #[ortho_config(default = 2_000)]
    pub places_timeout_ms: u64,
}

impl std::fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("db_max_connections", &self.db_max_connections)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<set>"))
            .field("places_api_key", &self.places_api_key.as_ref().map(|_| "<set>"))
            .field("places_endpoint", &self.places_endpoint)
            .field("places_timeout_ms", &self.places_timeout_ms)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

impl AppSettings {
    /// Parsed bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = non_blank(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            name: "bind_addr",
            value: raw.to_owned(),
            reason: err.to_string(),
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_ref())
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.max(1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn places_timeout(&self) -> Duration {
        Duration::from_millis(self.places_timeout_ms)
    }

    pub fn places_api_key(&self) -> Option<&str> {
        non_blank(self.places_api_key.as_ref())
    }

    /// Parsed Places endpoint, falling back to the public Google URL.
    pub fn places_endpoint(&self) -> Result<Url, SettingsError> {
        let raw = non_blank(self.places_endpoint.as_ref()).unwrap_or(DEFAULT_PLACES_ENDPOINT);
        Url::parse(raw).map_err(|err| SettingsError::Invalid {
            name: "places_endpoint",
            value: raw.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Resolve the token secret for `mode`.
    ///
    /// Debug builds without a configured secret get a random one; release
    /// builds refuse to start.
    pub fn token_secret(&self, mode: BuildMode) -> Result<TokenSecret, SettingsError> {
        if let Some(secret) = non_blank(self.token_secret.as_ref()) {
            return Ok(TokenSecret {
                bytes: Zeroizing::new(secret.as_bytes().to_vec()),
                ephemeral: false,
            });
        }
        match mode {
            BuildMode::Release => Err(SettingsError::Missing {
                name: "token_secret",
            }),
            BuildMode::Debug => {
                let mut bytes = Zeroizing::new(vec![0_u8; EPHEMERAL_SECRET_LEN]);
                rand::thread_rng().fill_bytes(&mut bytes);
                Ok(TokenSecret {
                    bytes,
                    ephemeral: true,
                })
            }
        }
    }
}
