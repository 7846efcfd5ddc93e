//! Builders wiring store adapters into the services behind `HttpState`.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use linkup_backend::domain::ports::{LinkupRepository, UserLocationRepository};
use linkup_backend::domain::{LinkupCommandService, LinkupQueryService, UserLocationService};
use linkup_backend::inbound::http::state::HttpState;
use linkup_backend::outbound::memory::InMemoryLinkupStore;
use linkup_backend::outbound::persistence::DieselLinkupRepository;

use super::ServerConfig;

/// Build handler state over the PostGIS store when a pool is configured,
/// otherwise over a fresh in-memory store.
pub(crate) fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => state_for_store(Arc::new(DieselLinkupRepository::new(pool.clone())), config),
        None => state_for_store(Arc::new(InMemoryLinkupStore::new()), config),
    }
}

fn state_for_store<R>(store: Arc<R>, config: &ServerConfig) -> HttpState
where
    R: LinkupRepository + UserLocationRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let commands = LinkupCommandService::new(
        Arc::clone(&store),
        Arc::clone(&config.place_resolver),
        Arc::clone(&clock),
    )
    .with_timeouts(config.store_timeout, config.place_timeout);
    let queries =
        LinkupQueryService::new(Arc::clone(&store)).with_store_timeout(config.store_timeout);
    let locations = UserLocationService::new(store, clock).with_store_timeout(config.store_timeout);

    HttpState::new(
        Arc::new(commands),
        Arc::new(queries),
        Arc::new(locations),
        Arc::clone(&config.token_verifier),
    )
}
