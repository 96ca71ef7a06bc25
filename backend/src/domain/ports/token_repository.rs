//! Port for API token storage.
//!
//! Stores only ever see [`TokenFingerprint`]s; plaintext keys stay with the
//! client.

use async_trait::async_trait;

use crate::domain::{TokenFingerprint, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token repository adapters.
    pub enum TokenRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "token repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store `fingerprint` as the user's only live token.
    async fn replace_token(
        &self,
        user: &UserId,
        fingerprint: &TokenFingerprint,
    ) -> Result<(), TokenRepositoryError>;

    /// Owner of the token with this fingerprint.
    async fn find_user_by_token(
        &self,
        fingerprint: &TokenFingerprint,
    ) -> Result<Option<UserId>, TokenRepositoryError>;
}
