//! Driving ports that turn session user ids and API tokens into identities.

use async_trait::async_trait;

use crate::domain::{ApiTokenKey, Error, Identity, LoginCredentials, UserId};

/// Resolves the acting [`Identity`] for a request.
///
/// Implementations must query current grants on every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Identity for a session user id. `None` when the user no longer exists.
    async fn resolve_user(&self, user_id: &UserId) -> Result<Option<Identity>, Error>;

    /// Identity owning an API token. `None` for unknown tokens.
    async fn resolve_token(&self, key: &ApiTokenKey) -> Result<Option<Identity>, Error>;
}

/// Issues API tokens in exchange for credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Authenticate and rotate the caller's token.
    async fn issue_token(&self, credentials: &LoginCredentials) -> Result<ApiTokenKey, Error>;
}
