//! Port abstraction for user and profile persistence.
//!
//! User writes and their profile side effect are one unit: adapters call the
//! supplied [`UserWriteHook`] after inserting or updating the user row and
//! apply the returned [`ProfileAction`](crate::domain::ProfileAction) before
//! committing.

use async_trait::async_trait;

use crate::domain::{
    LoginIdentifier, NewAccount, PasswordDigest, Role, User, UserId, UserProfile, UserWriteHook,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique column (`username` or `email`) already holds the value.
        Duplicate { field: String } => "user {field} is already in use",
        /// The referenced user does not exist.
        UnknownUser { id: String } => "user {id} does not exist",
    }
}

/// User record paired with its stored password digest.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password: PasswordDigest,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and run `hook` for its profile.
    async fn create_user(
        &self,
        account: &NewAccount,
        hook: &(dyn UserWriteHook + 'static),
    ) -> Result<UserProfile, UserPersistenceError>;

    /// Overwrite an existing account and run `hook` for its profile.
    async fn update_user(
        &self,
        user: &User,
        hook: &(dyn UserWriteHook + 'static),
    ) -> Result<UserProfile, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and password digest by email or username, for login.
    async fn find_credentials(
        &self,
        login: &LoginIdentifier,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// Fetch the profile attached to a user.
    async fn find_profile(&self, id: &UserId) -> Result<Option<UserProfile>, UserPersistenceError>;

    /// Change the role on an existing profile.
    async fn set_role(&self, id: &UserId, role: Role) -> Result<UserProfile, UserPersistenceError>;
}
