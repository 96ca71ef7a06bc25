//! Driving ports for account registration and self-service.

use async_trait::async_trait;

use crate::domain::{AccountUpdateForm, AccountView, Error, RegistrationForm, UserId};

/// Self-registration of new accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRegistration: Send + Sync {
    /// Validate the form and create the account with a Member profile.
    async fn register(&self, form: RegistrationForm) -> Result<AccountView, Error>;
}

/// Read access to the caller's own account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    async fn account(&self, user_id: &UserId) -> Result<AccountView, Error>;
}

/// Changes to the caller's own account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Apply the form and re-sync the profile.
    async fn update_account(
        &self,
        user_id: &UserId,
        form: AccountUpdateForm,
    ) -> Result<AccountView, Error>;
}
