//! Location fix reporting.
//!
//! ```text
//! PUT /api/v1/users/me/location
//! ```

use actix_web::{HttpResponse, put, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::linkups::LocationBody;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_coordinate};

/// Record the caller's current position and mark them active.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/location",
    request_body = LocationBody,
    responses(
        (status = 204, description = "Location recorded"),
        (status = 400, description = "Invalid coordinates", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    security(("bearer" = [])),
    tags = ["users"],
    operation_id = "reportLocation"
)]
#[put("/users/me/location")]
pub async fn report_location(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<LocationBody>,
) -> ApiResult<HttpResponse> {
    let LocationBody {
        latitude,
        longitude,
    } = payload.into_inner();
    let latitude = latitude.ok_or_else(|| missing_field_error(FieldName::new("latitude")))?;
    let longitude = longitude.ok_or_else(|| missing_field_error(FieldName::new("longitude")))?;
    let location = parse_coordinate(latitude, longitude)?;
    state.locations.report(caller.user_id(), location).await?;
    Ok(HttpResponse::NoContent().finish())
}
