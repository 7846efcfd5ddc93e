//! Backend entry-point: loads settings, selects adapters, and serves the API.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use linkup_backend::domain::ports::PlaceResolver;
use linkup_backend::inbound::http::health::HealthState;
use linkup_backend::outbound::persistence::{DbPool, PoolConfig};
use linkup_backend::outbound::places::HttpPlaceResolver;
use linkup_backend::outbound::tokens::JwtAccessTokenVerifier;

use server::{AppSettings, BuildMode, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    let config = build_server_config(&settings).await?;

    info!(
        bind_addr = %config.bind_addr(),
        database = config.uses_database(),
        "starting linkup backend"
    );

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}

async fn build_server_config(settings: &AppSettings) -> std::io::Result<ServerConfig> {
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    let secret = settings
        .token_secret(BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    if secret.is_ephemeral() {
        warn!("token_secret not set; using an ephemeral secret (dev only)");
    }
    let verifier = Arc::new(JwtAccessTokenVerifier::hs256(secret.as_bytes()));

    let mut config = ServerConfig::new(bind_addr, verifier)
        .with_timeouts(settings.request_timeout(), settings.places_timeout());

    match settings.database_url() {
        Some(url) => {
            let pool_config =
                PoolConfig::new(url).with_max_size(settings.db_max_connections());
            let pool = DbPool::new(pool_config)
                .await
                .map_err(std::io::Error::other)?;
            config = config.with_db_pool(pool);
        }
        None => warn!("database_url not set; using the in-memory store (dev only)"),
    }

    if let Some(resolver) = build_place_resolver(settings)? {
        config = config.with_place_resolver(resolver);
    }

    Ok(config)
}

fn build_place_resolver(
    settings: &AppSettings,
) -> std::io::Result<Option<Arc<dyn PlaceResolver>>> {
    let Some(api_key) = settings.places_api_key() else {
        info!("places_api_key not set; places resolve to manual");
        return Ok(None);
    };
    let endpoint = settings.places_endpoint().map_err(std::io::Error::other)?;
    let resolver = HttpPlaceResolver::new(endpoint, api_key.to_owned(), settings.places_timeout())
        .map_err(std::io::Error::other)?;
    Ok(Some(Arc::new(resolver)))
}
