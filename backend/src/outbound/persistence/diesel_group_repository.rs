//! PostgreSQL-backed `GroupRepository`.
//!
//! Grants are stored as rows of `group_permissions` pointing at the seeded
//! `permissions` registry.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{GroupRepository, GroupRepositoryError};
use crate::domain::{
    Capability, CapabilitySet, EntityType, GroupName, Permission, PermissionRegistry,
    ProvisioningOutcome, UserId,
};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{NewGroupPermissionRow, NewUserGroupRow};
use super::pool::{DbPool, PoolError};
use super::schema::{auth_groups, group_permissions, permissions, user_groups, users};

/// Diesel implementation of [`GroupRepository`].
#[derive(Clone)]
pub struct DieselGroupRepository {
    pool: DbPool,
}

impl DieselGroupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GroupRepositoryError {
    GroupRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: DieselError) -> GroupRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => GroupRepositoryError::connection(message),
        DieselFailure::Query(message) => GroupRepositoryError::query(message),
        DieselFailure::UniqueViolation(_) | DieselFailure::ForeignKeyViolation(_) => {
            GroupRepositoryError::query("group constraint violated")
        }
    }
}

fn capability_set(codenames: &[String]) -> CapabilitySet {
    codenames
        .iter()
        .filter_map(|codename| codename.parse::<Capability>().ok())
        .collect()
}

async fn group_id(conn: &mut AsyncPgConnection, name: &GroupName) -> QueryResult<Option<i64>> {
    auth_groups::table
        .filter(auth_groups::name.eq(name.as_ref()))
        .select(auth_groups::id)
        .first::<i64>(conn)
        .await
        .optional()
}

#[async_trait]
impl GroupRepository for DieselGroupRepository {
    async fn registered_permissions(
        &self,
        entity: EntityType,
    ) -> Result<PermissionRegistry, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let codenames: Vec<String> = permissions::table
            .filter(permissions::entity_type.eq(entity.as_str()))
            .select(permissions::codename)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(PermissionRegistry::from_codenames(entity, codenames))
    }

    async fn provision_group(
        &self,
        name: &GroupName,
        grants: &[Permission],
    ) -> Result<ProvisioningOutcome, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let (id, outcome) = match group_id(conn, name).await? {
                    Some(id) => (id, ProvisioningOutcome::Updated),
                    None => {
                        let id = diesel::insert_into(auth_groups::table)
                            .values(auth_groups::name.eq(name.as_ref()))
                            .returning(auth_groups::id)
                            .get_result::<i64>(conn)
                            .await?;
                        (id, ProvisioningOutcome::Created)
                    }
                };

                diesel::delete(group_permissions::table.filter(group_permissions::group_id.eq(id)))
                    .execute(conn)
                    .await?;

                let mut rows = Vec::with_capacity(grants.len());
                for grant in grants {
                    let permission_id = permissions::table
                        .filter(permissions::entity_type.eq(grant.entity.as_str()))
                        .filter(permissions::codename.eq(grant.capability.codename()))
                        .select(permissions::id)
                        .first::<i64>(conn)
                        .await?;
                    rows.push(NewGroupPermissionRow {
                        group_id: id,
                        permission_id,
                    });
                }
                if !rows.is_empty() {
                    diesel::insert_into(group_permissions::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok(outcome)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn group_grants(
        &self,
        name: &GroupName,
    ) -> Result<Option<CapabilitySet>, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(id) = group_id(&mut conn, name).await.map_err(map_diesel_error)? else {
            return Ok(None);
        };
        let codenames: Vec<String> = permissions::table
            .inner_join(group_permissions::table)
            .filter(group_permissions::group_id.eq(id))
            .select(permissions::codename)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Some(capability_set(&codenames)))
    }

    async fn add_member(
        &self,
        group: &GroupName,
        user: &UserId,
    ) -> Result<(), GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(id) = group_id(&mut conn, group).await.map_err(map_diesel_error)? else {
            return Err(GroupRepositoryError::unknown_group(group.to_string()));
        };
        let user_exists: bool =
            diesel::select(diesel::dsl::exists(users::table.find(user.as_uuid())))
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        if !user_exists {
            return Err(GroupRepositoryError::unknown_user(user.to_string()));
        }
        diesel::insert_into(user_groups::table)
            .values(&NewUserGroupRow {
                user_id: *user.as_uuid(),
                group_id: id,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn capabilities_for(&self, user: &UserId) -> Result<CapabilitySet, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let memberships = user_groups::table
            .filter(user_groups::user_id.eq(user.as_uuid()))
            .select(user_groups::group_id);
        let codenames: Vec<String> = permissions::table
            .inner_join(group_permissions::table)
            .filter(permissions::entity_type.eq(EntityType::Book.as_str()))
            .filter(group_permissions::group_id.eq_any(memberships))
            .select(permissions::codename)
            .distinct()
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(capability_set(&codenames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unknown_codenames_are_ignored() {
        let codenames = vec![
            "can_view".to_owned(),
            "can_archive".to_owned(),
            "can_edit".to_owned(),
        ];
        assert_eq!(
            capability_set(&codenames).codenames(),
            vec!["can_view", "can_edit"]
        );
    }

    #[rstest]
    fn closed_connections_are_connection_errors() {
        let err = map_pool_error(PoolError::build("refused"));
        assert_eq!(err, GroupRepositoryError::connection("refused"));
    }
}
