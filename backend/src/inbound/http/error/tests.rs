//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("pool exhausted on db-3")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}))
}

async fn response_parts(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let body = serde_json::from_slice(&bytes).expect("error JSON deserialises");
    (status, header, body)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("login required"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("can_delete required"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("book 7 not found"), StatusCode::NOT_FOUND)]
#[case(Error::duplicate("email"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("store down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error: Error) {
    let (status, header, body) = response_parts(&internal_error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body.message(), "Internal server error");
    assert_eq!(body.trace_id(), Some(TRACE_ID));
    assert!(body.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let error = Error::invalid_request("title: required")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"code": "validation_failed"}));

    let (status, header, body) = response_parts(&error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body, error);
}

#[rstest]
#[actix_web::test]
async fn trace_header_is_omitted_without_a_trace_id() {
    let error = Error::not_found("library 3 not found");
    let (_, header, body) = response_parts(&error).await;

    assert!(header.is_none());
    assert_eq!(body.code(), ErrorCode::NotFound);
}

#[rstest]
#[actix_web::test]
async fn configuration_codes_survive_redaction() {
    let error = Error::internal("group Editors names unknown codename can_fly")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"code": "configuration_error", "codename": "can_fly"}));

    let (status, _, body) = response_parts(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.message(), "Internal server error");
    assert_eq!(body.details(), Some(&json!({"code": "configuration_error"})));
}

#[rstest]
#[case(json!({"code": "pool_exhausted"}))]
#[case(json!({"code": 7}))]
#[case(json!("configuration_error"))]
fn only_listed_codes_are_public(#[case] details: serde_json::Value) {
    assert!(public_detail_code(Some(&details)).is_none());
}

#[rstest]
fn framework_server_errors_become_opaque_internal_errors() {
    let actix = actix_web::error::ErrorBadGateway("upstream secret");
    let error = Error::from(actix);

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(error.message(), "Internal server error");
}

#[rstest]
fn framework_client_errors_stay_client_errors() {
    let actix = actix_web::error::ErrorPayloadTooLarge("body over 256kB");
    let error = Error::from(actix);

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), "Payload Too Large");
}
