//! Shared validation helpers for inbound HTTP adapters.

use actix_web::{HttpRequest, error::JsonPayloadError, web};
use serde_json::json;

use crate::domain::{Coordinate, Error, LinkupId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidNumber,
    InvalidCoordinates,
    InvalidBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidNumber => "invalid_number",
            ErrorCode::InvalidCoordinates => "invalid_coordinates",
            ErrorCode::InvalidBody => "invalid_body",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

pub(crate) fn parse_linkup_id(raw: &str, field: FieldName) -> Result<LinkupId, Error> {
    LinkupId::parse(raw).map_err(|_| {
        Error::invalid_request(format!("{} must be a valid UUID", field.as_str())).with_details(
            json!({
                "field": field.as_str(),
                "value": raw,
                "code": ErrorCode::InvalidUuid.as_str(),
            }),
        )
    })
}

/// Parse a numeric query parameter.
pub(crate) fn parse_number(raw: &str, field: FieldName) -> Result<f64, Error> {
    raw.trim().parse::<f64>().map_err(|_| {
        let name = field.as_str();
        field_error(
            field,
            format!("{name} must be a number"),
            ErrorCode::InvalidNumber,
        )
    })
}

/// Validate a latitude/longitude pair.
pub(crate) fn parse_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, Error> {
    Coordinate::new(latitude, longitude).map_err(|err| {
        Error::invalid_request("Invalid coordinates").with_details(json!({
            "field": "location",
            "reason": err.to_string(),
            "code": ErrorCode::InvalidCoordinates.as_str(),
        }))
    })
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request("Invalid request data")
        .with_details(json!({
            "reason": err.to_string(),
            "code": ErrorCode::InvalidBody.as_str(),
        }))
        .into()
}

/// JSON extractor configuration that answers malformed bodies with the
/// standard error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    #[rstest]
    #[case("42.28", Some(42.28))]
    #[case(" -83.74 ", Some(-83.74))]
    #[case("north", None)]
    #[case("", None)]
    fn numbers_parse_or_fail(#[case] raw: &str, #[case] expected: Option<f64>) {
        let parsed = parse_number(raw, FieldName::new("latitude")).ok();
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case(91.0, 0.0)]
    #[case(0.0, -181.0)]
    #[case(f64::NAN, 0.0)]
    fn out_of_range_coordinates_are_rejected(#[case] lat: f64, #[case] lng: f64) {
        let err = parse_coordinate(lat, lng).expect_err("rejected");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(err.message(), "Invalid coordinates");
    }

    #[rstest]
    fn bad_linkup_ids_echo_the_value() {
        let err = parse_linkup_id("abc", FieldName::new("id")).expect_err("bad id");
        let details = err.details().expect("details");
        assert_eq!(details["value"], "abc");
        assert_eq!(details["code"], "invalid_uuid");
    }

    #[rstest]
    fn missing_fields_name_the_field() {
        let err = missing_field_error(FieldName::new("vibe"));
        assert_eq!(err.message(), "missing required field: vibe");
    }
}
