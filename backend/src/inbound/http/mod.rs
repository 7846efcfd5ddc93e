//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod auth;
pub mod error;
pub mod health;
pub mod linkups;
pub mod locations;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// Register every authenticated endpoint under `/api/v1`.
///
/// # Examples
/// ```ignore
/// App::new().app_data(state).service(web::scope("/api/v1").configure(api_routes))
/// ```
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::json_config())
        .service(linkups::create_linkup)
        .service(linkups::list_nearby_linkups)
        .service(linkups::list_my_linkups)
        .service(linkups::join_linkup)
        .service(linkups::cancel_linkup)
        .service(locations::report_location);
}
