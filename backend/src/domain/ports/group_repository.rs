//! Port for groups, their capability grants and memberships.

use async_trait::async_trait;

use crate::domain::{
    CapabilitySet, EntityType, GroupName, Permission, PermissionRegistry, ProvisioningOutcome,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by group repository adapters.
    pub enum GroupRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "group repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "group repository query failed: {message}",
        /// The named group does not exist.
        UnknownGroup { name: String } => "group {name} does not exist",
        /// The referenced user does not exist.
        UnknownUser { id: String } => "user {id} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Capabilities registered for `entity` in the store.
    async fn registered_permissions(
        &self,
        entity: EntityType,
    ) -> Result<PermissionRegistry, GroupRepositoryError>;

    /// Create the group if needed and replace its grants with `grants`.
    ///
    /// Clearing and re-adding happens atomically.
    async fn provision_group(
        &self,
        name: &GroupName,
        grants: &[Permission],
    ) -> Result<ProvisioningOutcome, GroupRepositoryError>;

    /// Current grants of a group, `None` when it does not exist.
    async fn group_grants(
        &self,
        name: &GroupName,
    ) -> Result<Option<CapabilitySet>, GroupRepositoryError>;

    /// Add `user` to `group`. Adding an existing member is a no-op.
    async fn add_member(&self, group: &GroupName, user: &UserId)
    -> Result<(), GroupRepositoryError>;

    /// Union of capabilities granted to `user` through all their groups.
    async fn capabilities_for(&self, user: &UserId) -> Result<CapabilitySet, GroupRepositoryError>;
}
