//! Driving port for staff-only access administration.

use async_trait::async_trait;

use crate::domain::{Actor, Error, GroupName, ProvisioningSummary, Role, UserId, UserProfile};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessAdministration: Send + Sync {
    /// Provision the standard groups. Requires staff.
    async fn provision_groups(&self, actor: &Actor) -> Result<ProvisioningSummary, Error>;

    /// Add a user to a named group. Requires staff.
    async fn assign_group(
        &self,
        actor: &Actor,
        user_id: &UserId,
        group: &GroupName,
    ) -> Result<(), Error>;

    /// Change a user's profile role. Requires staff.
    async fn assign_role(
        &self,
        actor: &Actor,
        user_id: &UserId,
        role: Role,
    ) -> Result<UserProfile, Error>;
}
