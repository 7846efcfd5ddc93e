//! OpenAPI documentation configuration.
//!
//! Registers every handler under `inbound::http`, the error envelope schemas,
//! and the bearer token security scheme. Served by Swagger UI in debug builds.

use crate::domain::{FanoutSummary, LinkupRole, LinkupStatus};
use crate::inbound::http::linkups::{
    CancelLinkupResponseBody, CreateLinkupBody, CreateLinkupResponseBody, JoinLinkupResponseBody,
    LocationBody, NearbyLinkupBody, NearbyLinkupList, UserLinkupBody, UserLinkupList,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the security scheme referenced by handler annotations.
pub const BEARER_SCHEME: &str = "bearer";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("HS256 token whose `sub` claim is the caller's user id."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Linkup backend API",
        description = "Ephemeral location-scoped invites matched first come, first served."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::linkups::create_linkup,
        crate::inbound::http::linkups::list_nearby_linkups,
        crate::inbound::http::linkups::list_my_linkups,
        crate::inbound::http::linkups::join_linkup,
        crate::inbound::http::linkups::cancel_linkup,
        crate::inbound::http::locations::report_location,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CreateLinkupBody,
        CreateLinkupResponseBody,
        FanoutSummary,
        JoinLinkupResponseBody,
        CancelLinkupResponseBody,
        LocationBody,
        NearbyLinkupBody,
        NearbyLinkupList,
        UserLinkupBody,
        UserLinkupList,
        LinkupStatus,
        LinkupRole,
    )),
    tags(
        (name = "linkups", description = "Create, discover, join, and cancel linkups"),
        (name = "users", description = "Caller location reporting"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
