//! Unit coverage for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

use crate::domain::TraceId;

#[rstest]
#[case(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("x"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("x"), ErrorCode::Forbidden)]
#[case(Error::not_found("x"), ErrorCode::NotFound)]
#[case(Error::conflict("x"), ErrorCode::Conflict)]
#[case(Error::internal("x"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] err: Error, #[case] expected: ErrorCode) {
    assert_eq!(err.code(), expected);
    assert_eq!(err.message(), "x");
}

#[rstest]
fn trace_id_is_absent_outside_request_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[tokio::test]
async fn trace_id_is_captured_inside_request_scope() {
    let id = TraceId::generate();
    let err = TraceId::scope(id, async { Error::conflict("full") }).await;
    assert_eq!(err.trace_id(), Some(id.to_string().as_str()));
}

#[rstest]
fn serialises_camel_case_and_skips_empty_fields() {
    let err = Error::invalid_request("bad vibe").with_details(json!({ "field": "vibe" }));
    let value = serde_json::to_value(&err).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "bad vibe",
            "details": { "field": "vibe" }
        })
    );

    let traced = Error::not_found("gone").with_trace_id("abc");
    let value = serde_json::to_value(&traced).expect("serialise error");
    assert_eq!(value.get("trace_id"), Some(&json!("abc")));
    assert!(value.get("traceId").is_none());
}

#[rstest]
fn display_uses_message() {
    assert_eq!(Error::forbidden("only the initiator").to_string(), "only the initiator");
}
