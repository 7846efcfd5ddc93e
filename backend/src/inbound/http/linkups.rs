//! Linkup HTTP handlers.
//!
//! ```text
//! POST   /api/v1/linkups
//! GET    /api/v1/linkups/nearby?latitude&longitude&max_radius
//! GET    /api/v1/linkups
//! POST   /api/v1/linkups/{id}/join
//! DELETE /api/v1/linkups/{id}
//! ```
//!
//! Request and response bodies use snake_case field names.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    CancelLinkupRequest, CreateLinkupRequest, JoinLinkupRequest, ListNearbyRequest,
};
use crate::domain::{
    Error, FanoutSummary, LinkupRole, LinkupStatus, NearbyLinkup, UserId, UserLinkup,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_coordinate, parse_linkup_id, parse_number,
};

pub(crate) const CREATED_MESSAGE: &str = "Linkup created successfully";
pub(crate) const JOINED_MESSAGE: &str = "Successfully joined linkup";
pub(crate) const CANCELLED_MESSAGE: &str = "Linkup cancelled successfully";

/// Location object in request bodies.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LocationBody {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Request payload for creating a linkup.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateLinkupBody {
    #[schema(example = "coffee")]
    pub vibe: Option<String>,
    pub message: Option<String>,
    /// Meters. Values outside (0, 5000] fall back to 500.
    pub search_radius: Option<f64>,
    pub location: Option<LocationBody>,
}

/// Response payload for a created linkup.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLinkupResponseBody {
    pub linkup_id: String,
    pub message: String,
    pub fan_out: FanoutSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinLinkupResponseBody {
    pub linkup_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelLinkupResponseBody {
    pub message: String,
}

/// Query string for the nearby listing. Parsed by hand so malformed radii
/// fall back to the default instead of failing the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Meters. Missing, malformed, or non-positive values use 5000.
    pub max_radius: Option<String>,
}

/// One invited linkup near the caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NearbyLinkupBody {
    pub linkup_id: String,
    pub initiator_id: String,
    pub initiator_name: Option<String>,
    /// Meters from the query point to the initiator.
    pub distance: f64,
    pub vibe: String,
    pub message: String,
    pub created_at: String,
}

impl From<NearbyLinkup> for NearbyLinkupBody {
    fn from(value: NearbyLinkup) -> Self {
        Self {
            linkup_id: value.linkup_id.to_string(),
            initiator_id: value.initiator_id.to_string(),
            initiator_name: value.initiator_name,
            distance: value.distance_meters,
            vibe: value.vibe,
            message: value.message,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// One linkup the caller initiated or joined.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserLinkupBody {
    pub linkup_id: String,
    pub status: LinkupStatus,
    pub partner_id: Option<String>,
    pub vibe: String,
    pub message: String,
    pub created_at: String,
    pub role: LinkupRole,
}

impl From<UserLinkup> for UserLinkupBody {
    fn from(value: UserLinkup) -> Self {
        Self {
            linkup_id: value.linkup_id.to_string(),
            status: value.status,
            partner_id: value.partner_id.map(|id| id.to_string()),
            vibe: value.vibe,
            message: value.message,
            created_at: value.created_at.to_rfc3339(),
            role: value.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NearbyLinkupList {
    pub linkups: Vec<NearbyLinkupBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserLinkupList {
    pub linkups: Vec<UserLinkupBody>,
}

fn parse_create_body(
    initiator: UserId,
    body: CreateLinkupBody,
) -> Result<CreateLinkupRequest, Error> {
    let vibe = body
        .vibe
        .ok_or_else(|| missing_field_error(FieldName::new("vibe")))?;
    let location = body
        .location
        .ok_or_else(|| missing_field_error(FieldName::new("location")))?;
    let latitude = location
        .latitude
        .ok_or_else(|| missing_field_error(FieldName::new("location.latitude")))?;
    let longitude = location
        .longitude
        .ok_or_else(|| missing_field_error(FieldName::new("location.longitude")))?;

    Ok(CreateLinkupRequest {
        initiator,
        origin: parse_coordinate(latitude, longitude)?,
        search_radius: body.search_radius,
        vibe,
        message: body.message.unwrap_or_default(),
    })
}

fn parse_nearby_query(user: UserId, query: NearbyQuery) -> Result<ListNearbyRequest, Error> {
    let latitude_field = FieldName::new("latitude");
    let longitude_field = FieldName::new("longitude");
    let latitude = query
        .latitude
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(latitude_field))?;
    let longitude = query
        .longitude
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(longitude_field))?;
    let origin = parse_coordinate(
        parse_number(latitude, latitude_field)?,
        parse_number(longitude, longitude_field)?,
    )?;
    let max_radius = query
        .max_radius
        .as_deref()
        .and_then(|raw| parse_number(raw, FieldName::new("max_radius")).ok());

    Ok(ListNearbyRequest {
        user,
        origin,
        max_radius,
    })
}

/// Create a linkup and invite nearby users.
#[utoipa::path(
    post,
    path = "/api/v1/linkups",
    request_body = CreateLinkupBody,
    responses(
        (status = 201, description = "Linkup created", body = CreateLinkupResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    security(("bearer" = [])),
    tags = ["linkups"],
    operation_id = "createLinkup"
)]
#[post("/linkups")]
pub async fn create_linkup(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateLinkupBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create_body(caller.user_id(), payload.into_inner())?;
    let created = state.linkups.create(request).await?;
    Ok(HttpResponse::Created().json(CreateLinkupResponseBody {
        linkup_id: created.linkup_id.to_string(),
        message: CREATED_MESSAGE.to_owned(),
        fan_out: created.fan_out.summary(),
    }))
}

/// List linkups the caller is invited to near a point, nearest first.
#[utoipa::path(
    get,
    path = "/api/v1/linkups/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Invited linkups", body = NearbyLinkupList),
        (status = 400, description = "Missing or invalid coordinates", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    security(("bearer" = [])),
    tags = ["linkups"],
    operation_id = "listNearbyLinkups"
)]
#[get("/linkups/nearby")]
pub async fn list_nearby_linkups(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    query: web::Query<NearbyQuery>,
) -> ApiResult<web::Json<NearbyLinkupList>> {
    let request = parse_nearby_query(caller.user_id(), query.into_inner())?;
    let rows = state.linkup_queries.list_nearby(request).await?;
    Ok(web::Json(NearbyLinkupList {
        linkups: rows.into_iter().map(NearbyLinkupBody::from).collect(),
    }))
}

/// List linkups the caller initiated or joined, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/linkups",
    responses(
        (status = 200, description = "Caller's linkups", body = UserLinkupList),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    security(("bearer" = [])),
    tags = ["linkups"],
    operation_id = "listMyLinkups"
)]
#[get("/linkups")]
pub async fn list_my_linkups(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<web::Json<UserLinkupList>> {
    let rows = state.linkup_queries.list_mine(caller.user_id()).await?;
    Ok(web::Json(UserLinkupList {
        linkups: rows.into_iter().map(UserLinkupBody::from).collect(),
    }))
}

/// Claim the second seat of a searching linkup.
#[utoipa::path(
    post,
    path = "/api/v1/linkups/{id}/join",
    params(("id" = String, Path, description = "Linkup identifier")),
    responses(
        (status = 200, description = "Joined", body = JoinLinkupResponseBody),
        (status = 400, description = "Invalid id or own linkup", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Linkup not found", body = ErrorSchema),
        (status = 409, description = "Linkup already filled", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    security(("bearer" = [])),
    tags = ["linkups"],
    operation_id = "joinLinkup"
)]
#[post("/linkups/{id}/join")]
pub async fn join_linkup(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<JoinLinkupResponseBody>> {
    let linkup_id = parse_linkup_id(&path.into_inner(), FieldName::new("id"))?;
    let joined = state
        .linkups
        .join(JoinLinkupRequest {
            linkup_id,
            joiner: caller.user_id(),
        })
        .await?;
    Ok(web::Json(JoinLinkupResponseBody {
        linkup_id: joined.to_string(),
        message: JOINED_MESSAGE.to_owned(),
    }))
}

/// Cancel a searching linkup the caller initiated.
#[utoipa::path(
    delete,
    path = "/api/v1/linkups/{id}",
    params(("id" = String, Path, description = "Linkup identifier")),
    responses(
        (status = 200, description = "Cancelled", body = CancelLinkupResponseBody),
        (status = 400, description = "Invalid id or already confirmed", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not the initiator", body = ErrorSchema),
        (status = 404, description = "Linkup not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    security(("bearer" = [])),
    tags = ["linkups"],
    operation_id = "cancelLinkup"
)]
#[delete("/linkups/{id}")]
pub async fn cancel_linkup(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<CancelLinkupResponseBody>> {
    let linkup_id = parse_linkup_id(&path.into_inner(), FieldName::new("id"))?;
    state
        .linkups
        .cancel(CancelLinkupRequest {
            linkup_id,
            caller: caller.user_id(),
        })
        .await?;
    Ok(web::Json(CancelLinkupResponseBody {
        message: CANCELLED_MESSAGE.to_owned(),
    }))
}

#[cfg(test)]
#[path = "linkups_tests.rs"]
mod tests;
