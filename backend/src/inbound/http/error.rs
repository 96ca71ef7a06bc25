//! Rendering of domain errors as JSON responses.
//!
//! Client-facing failures pass through unchanged. Internal failures are logged
//! in full against their trace id and then reduced to a generic message; the
//! only details that survive are the machine-readable codes in
//! [`PUBLIC_INTERNAL_CODES`], such as a misconfigured group registry.

use std::borrow::Cow;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Internal `details.code` values an operator may see in a response body.
pub const PUBLIC_INTERNAL_CODES: [&str; 1] = ["configuration_error"];

const REDACTED_MESSAGE: &str = "Internal server error";

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(public_view(self))
    }
}

fn public_detail_code(details: Option<&Value>) -> Option<&str> {
    let code = details?.get("code")?.as_str()?;
    PUBLIC_INTERNAL_CODES.contains(&code).then_some(code)
}

/// The error as a client may see it.
fn public_view(error: &Error) -> Cow<'_, Error> {
    if error.code() != ErrorCode::InternalError {
        return Cow::Borrowed(error);
    }

    error!(
        trace_id = error.trace_id().unwrap_or("-"),
        message = error.message(),
        details = ?error.details(),
        "internal error returned to client"
    );
    let mut redacted = Error::internal(REDACTED_MESSAGE);
    if let Some(code) = public_detail_code(error.details()) {
        redacted = redacted.with_details(json!({ "code": code }));
    }
    if let Some(id) = error.trace_id() {
        redacted = redacted.with_trace_id(id.to_owned());
    }
    Cow::Owned(redacted)
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        let status = err.as_response_error().status_code();
        if status.is_client_error() {
            warn!(error = %err, %status, "request rejected by the framework");
            return Error::invalid_request(
                status.canonical_reason().unwrap_or("Bad Request").to_owned(),
            );
        }
        error!(error = %err, "framework error promoted to domain error");
        Error::internal(REDACTED_MESSAGE)
    }
}

#[cfg(test)]
mod tests;
