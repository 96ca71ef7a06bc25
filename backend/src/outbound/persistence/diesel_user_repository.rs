//! PostgreSQL-backed `UserRepository`.
//!
//! A user write and the profile row chosen by the hook commit in one
//! transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{
    LoginIdentifier, NewAccount, PasswordDigest, Role, User, UserId, UserProfile, UserWrite,
    UserWriteHook,
};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{NewUserRow, ProfileRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{user_profiles, users};

/// Diesel implementation of [`UserRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: DieselError) -> UserPersistenceError {
    let failure = classify_diesel_error(error);
    if failure.violates("username") {
        return UserPersistenceError::duplicate("username");
    }
    if failure.violates("email") {
        return UserPersistenceError::duplicate("email");
    }
    match failure {
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::UniqueViolation(_) => UserPersistenceError::duplicate("id"),
        DieselFailure::Query(message) => UserPersistenceError::query(message),
        DieselFailure::ForeignKeyViolation(_) => {
            UserPersistenceError::query("user reference violated")
        }
    }
}

fn corrupt_row(error: impl std::error::Error + Send + Sync + 'static) -> DieselError {
    DieselError::DeserializationError(Box::new(error))
}

fn row_to_user(row: &UserRow) -> Result<User, UserPersistenceError> {
    row.to_user()
        .map_err(|err| UserPersistenceError::query(format!("stored user is invalid: {err}")))
}

/// Run the profile hook and upsert whatever profile it settles on.
async fn sync_profile(
    conn: &mut AsyncPgConnection,
    user: &User,
    write: UserWrite,
    hook: &dyn UserWriteHook,
) -> QueryResult<UserProfile> {
    let existing = user_profiles::table
        .find(user.id().as_uuid())
        .select(ProfileRow::as_select())
        .first::<ProfileRow>(conn)
        .await
        .optional()?
        .map(|row| row.to_profile())
        .transpose()
        .map_err(corrupt_row)?;

    let profile = hook.after_user_write(user, write, existing).into_profile();
    let row = ProfileRow::from_profile(&profile);
    diesel::insert_into(user_profiles::table)
        .values(&row)
        .on_conflict(user_profiles::user_id)
        .do_update()
        .set(user_profiles::role.eq(&row.role))
        .execute(conn)
        .await?;
    Ok(profile)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_user(
        &self,
        account: &NewAccount,
        hook: &(dyn UserWriteHook + 'static),
    ) -> Result<UserProfile, UserPersistenceError> {
        let user = &account.user;
        let flags = user.flags();
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            email: user.email().as_ref(),
            password_hash: account.password.as_str(),
            date_of_birth: user.date_of_birth(),
            profile_photo: user.profile_photo().map(AsRef::as_ref),
            is_active: flags.is_active,
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                sync_profile(conn, user, UserWrite::Created, hook).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update_user(
        &self,
        user: &User,
        hook: &(dyn UserWriteHook + 'static),
    ) -> Result<UserProfile, UserPersistenceError> {
        let changes = UserUpdate::from_user(user);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let profile = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(users::table.find(user.id().as_uuid()))
                        .set(&changes)
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Ok(None);
                    }
                    sync_profile(conn, user, UserWrite::Updated, hook)
                        .await
                        .map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        profile.ok_or_else(|| UserPersistenceError::unknown_user(user.id().to_string()))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_credentials(
        &self,
        login: &LoginIdentifier,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let query = users::table.select(UserRow::as_select()).into_boxed();
        let query = match login {
            LoginIdentifier::Email(email) => query.filter(users::email.eq(email.as_ref())),
            LoginIdentifier::Username(username) => {
                query.filter(users::username.eq(username.as_ref()))
            }
        };
        let Some(row) = query
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let password = PasswordDigest::from_stored(row.password_hash.as_str())
            .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        Ok(Some(StoredCredentials {
            user: row_to_user(&row)?,
            password,
        }))
    }

    async fn find_profile(&self, id: &UserId) -> Result<Option<UserProfile>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = user_profiles::table
            .find(id.as_uuid())
            .select(ProfileRow::as_select())
            .first::<ProfileRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|stored| stored.to_profile())
            .transpose()
            .map_err(|err| UserPersistenceError::query(err.to_string()))
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<UserProfile, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let exists: bool = diesel::select(diesel::dsl::exists(users::table.find(id.as_uuid())))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if !exists {
            return Err(UserPersistenceError::unknown_user(id.to_string()));
        }
        let profile = UserProfile::new(id.clone(), role);
        let row = ProfileRow::from_profile(&profile);
        diesel::insert_into(user_profiles::table)
            .values(&row)
            .on_conflict(user_profiles::user_id)
            .do_update()
            .set(user_profiles::role.eq(&row.role))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage; query behaviour is exercised against a live
    //! database only.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let err = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(err, UserPersistenceError::connection("timed out"));
    }

    #[rstest]
    fn missing_rows_become_query_errors() {
        let err = map_diesel_error(DieselError::NotFound);
        assert_eq!(err, UserPersistenceError::query("record not found"));
    }

    #[rstest]
    fn corrupt_rows_are_deserialization_errors() {
        let err = corrupt_row(crate::domain::UnknownRole("Janitor".to_owned()));
        assert!(matches!(err, DieselError::DeserializationError(_)));
    }
}
