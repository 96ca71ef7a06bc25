//! Group provisioning and membership administration.
//!
//! Provisioning resolves every planned capability against the registry
//! before writing anything, so a missing capability leaves all groups
//! untouched.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::account_service::{map_group_error, map_user_error};
use crate::domain::ports::{AccessAdministration, GroupRepository, UserRepository};
use crate::domain::{
    Actor, CapabilitySet, ConfigurationError, EntityType, Error, GroupName, GroupPlan, GroupReport,
    Permission, ProvisioningSummary, Requirement, Role, UserId, UserProfile, default_group_plans,
};

fn configuration_error(error: ConfigurationError) -> Error {
    Error::internal(error.to_string()).with_details(json!({ "code": "configuration_error" }))
}

/// Service implementing [`AccessAdministration`].
#[derive(Clone)]
pub struct AccessAdministrationService<G, U> {
    groups: Arc<G>,
    users: Arc<U>,
    plans: Vec<GroupPlan>,
}

impl<G, U> AccessAdministrationService<G, U> {
    /// Create a service provisioning the standard Viewers/Editors/Admins plans.
    pub fn new(groups: Arc<G>, users: Arc<U>) -> Self {
        Self::with_plans(groups, users, default_group_plans())
    }

    /// Create a service provisioning custom plans.
    pub fn with_plans(groups: Arc<G>, users: Arc<U>, plans: Vec<GroupPlan>) -> Self {
        Self {
            groups,
            users,
            plans,
        }
    }
}

impl<G, U> AccessAdministrationService<G, U>
where
    G: GroupRepository,
    U: UserRepository,
{
    /// Provision every plan without an access check.
    ///
    /// Re-running replaces each group's grants, so repeated runs converge on
    /// identical grant sets.
    pub async fn provision(&self) -> Result<ProvisioningSummary, Error> {
        let registry = self
            .groups
            .registered_permissions(EntityType::Book)
            .await
            .map_err(map_group_error)?;

        let resolved = self
            .plans
            .iter()
            .map(|plan| {
                plan.capabilities
                    .iter()
                    .map(|capability| registry.lookup(EntityType::Book, *capability))
                    .collect::<Result<Vec<Permission>, _>>()
                    .map(|grants| (plan, grants))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(configuration_error)?;

        let mut summary = ProvisioningSummary::default();
        for (plan, grants) in resolved {
            let outcome = self
                .groups
                .provision_group(&plan.name, &grants)
                .await
                .map_err(map_group_error)?;
            let granted: CapabilitySet = grants.iter().map(|grant| grant.capability).collect();
            info!(group = %plan.name, ?outcome, grants = ?granted.codenames(), "group provisioned");
            summary
                .groups
                .push(GroupReport::new(plan.name.clone(), outcome, &granted));
        }
        Ok(summary)
    }
}

#[async_trait]
impl<G, U> AccessAdministration for AccessAdministrationService<G, U>
where
    G: GroupRepository,
    U: UserRepository,
{
    async fn provision_groups(&self, actor: &Actor) -> Result<ProvisioningSummary, Error> {
        actor.require(Requirement::Staff)?;
        self.provision().await
    }

    async fn assign_group(
        &self,
        actor: &Actor,
        user_id: &UserId,
        group: &GroupName,
    ) -> Result<(), Error> {
        actor.require(Requirement::Staff)?;
        self.groups
            .add_member(group, user_id)
            .await
            .map_err(map_group_error)
    }

    async fn assign_role(
        &self,
        actor: &Actor,
        user_id: &UserId,
        role: Role,
    ) -> Result<UserProfile, Error> {
        actor.require(Requirement::Staff)?;
        self.users
            .set_role(user_id, role)
            .await
            .map_err(map_user_error)
    }
}
