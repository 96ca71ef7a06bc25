//! Shared Diesel error classification for the repository adapters.
//!
//! Each repository maps a [`DieselFailure`] onto its own port error, so the
//! logging and constraint inspection live in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Coarse outcome of a failed Diesel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    Connection(&'static str),
    Query(&'static str),
    /// Unique constraint violated; carries the constraint name when known.
    UniqueViolation(Option<String>),
    /// Foreign key violated; carries the constraint name when known.
    ForeignKeyViolation(Option<String>),
}

impl DieselFailure {
    /// Whether this is a unique violation on a constraint whose name
    /// contains `fragment`.
    pub fn violates(&self, fragment: &str) -> bool {
        matches!(
            self,
            Self::UniqueViolation(Some(constraint)) if constraint.contains(fragment)
        )
    }
}

/// Extract a readable message from a pool error.
pub(crate) fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Log and classify a Diesel error.
pub(crate) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation(info.constraint_name().map(str::to_owned))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DieselFailure::ForeignKeyViolation(info.constraint_name().map(str::to_owned))
        }
        _ => DieselFailure::Query("database error"),
    }
}
