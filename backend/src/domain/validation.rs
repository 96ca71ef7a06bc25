//! Field-level validation error collection.
//!
//! Forms validate every field before failing so callers receive all
//! messages in one response.

use std::collections::BTreeMap;

use serde_json::json;

use super::Error;

/// Messages keyed by the form field they concern.
///
/// # Examples
/// ```
/// use backend::domain::{ErrorCode, FieldErrors};
///
/// let mut errors = FieldErrors::default();
/// errors.add("title", "Title must be at least 2 characters long.");
/// let err = errors.into_result(()).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    /// Record a message against `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Record the error of a fallible field parse, yielding the value on success.
    pub fn check<T, E: ToString>(&mut self, field: &'static str, result: Result<T, E>) -> Option<T> {
        result
            .map_err(|err| self.add(field, err.to_string()))
            .ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded, otherwise an
    /// [`ErrorCode::InvalidRequest`](super::ErrorCode::InvalidRequest) error
    /// carrying every message under `details.fields`.
    pub fn into_result<T>(self, value: T) -> Result<T, Error> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self.into_error())
        }
    }

    pub fn into_error(self) -> Error {
        Error::invalid_request("validation failed").with_details(json!({
            "code": "validation_failed",
            "fields": self.0,
        }))
    }
}
