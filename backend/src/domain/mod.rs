//! Domain primitives, services and ports.
//!
//! Purpose: define the catalogue, account and access-control model used by
//! the HTTP adapters and the persistence layer. Types are validated on
//! construction and document their invariants in Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, UserProfile, Role: accounts and their profile role.
//! - PermissionRegistry, Capability, GroupName: capability model.
//! - Identity, Actor, AccessGate: the gate evaluated before every catalogue
//!   operation.
//! - Book, Author, Library, Librarian and their forms.
//! - AccountService, AccessAdministrationService, CatalogueService: the
//!   driving-port implementations.

pub mod access;
pub mod access_administration_service;
pub mod account_service;
pub mod accounts;
pub mod auth;
pub mod catalogue;
pub mod catalogue_service;
pub mod error;
pub mod groups;
pub mod permissions;
pub mod ports;
pub mod profile;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::access::{
    AccessGate, AccessSurface, Actor, CatalogueOperation, Identity, Requirement,
};
pub use self::access_administration_service::AccessAdministrationService;
pub use self::account_service::AccountService;
pub use self::accounts::{AccountUpdateForm, AccountView, NewAccount, RegistrationForm};
pub use self::auth::{
    ApiTokenKey, LoginCredentials, LoginIdentifier, LoginValidationError, PASSWORD_MIN, PasswordDigest,
    PasswordError, TokenFingerprint,
};
pub use self::catalogue::{
    AUTHOR_NAME_MAX, Author, AuthorId, Book, BookDraft, BookFilter, BookForm, BookId,
    LIBRARIAN_NAME_MAX, LIBRARY_NAME_MAX, Librarian, LibrarianDraft, LibrarianForm, LibrarianId,
    Library, LibraryDetail, LibraryDraft, LibraryForm, LibraryId, MIN_NAME_LENGTH,
    MIN_PUBLICATION_YEAR, SEARCH_QUERY_MAX, TITLE_MAX, publication_year_ceiling,
};
pub use self::catalogue_service::CatalogueService;
pub use self::error::{Error, ErrorCode};
pub use self::groups::{
    GroupName, GroupNameError, GroupPlan, GroupReport, ProvisioningOutcome, ProvisioningSummary,
    default_group_plans,
};
pub use self::permissions::{
    Capability, CapabilitySet, ConfigurationError, EntityType, Permission, PermissionRegistry,
    UnknownCapability,
};
#[cfg(test)]
pub use self::profile::MockUserWriteHook;
pub use self::profile::{
    ProfileAction, ProfileSync, Role, UnknownRole, UserProfile, UserWrite, UserWriteHook,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    AccountFlags, EmailAddress, ProfilePhoto, User, UserId, UserValidationError, Username,
};
pub use self::validation::FieldErrors;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
