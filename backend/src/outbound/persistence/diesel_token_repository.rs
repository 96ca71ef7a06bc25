//! PostgreSQL-backed `TokenRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TokenRepository, TokenRepositoryError};
use crate::domain::{TokenFingerprint, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::NewTokenRow;
use super::pool::{DbPool, PoolError};
use super::schema::api_tokens;

/// Diesel implementation of [`TokenRepository`].
#[derive(Clone)]
pub struct DieselTokenRepository {
    pool: DbPool,
}

impl DieselTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TokenRepositoryError {
    TokenRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: DieselError) -> TokenRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => TokenRepositoryError::connection(message),
        DieselFailure::Query(message) => TokenRepositoryError::query(message),
        DieselFailure::UniqueViolation(_) | DieselFailure::ForeignKeyViolation(_) => {
            TokenRepositoryError::query("token constraint violated")
        }
    }
}

#[async_trait]
impl TokenRepository for DieselTokenRepository {
    async fn replace_token(
        &self,
        user: &UserId,
        fingerprint: &TokenFingerprint,
    ) -> Result<(), TokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(api_tokens::table)
            .values(&NewTokenRow {
                user_id: *user.as_uuid(),
                fingerprint: fingerprint.as_str(),
            })
            .on_conflict(api_tokens::user_id)
            .do_update()
            .set((
                api_tokens::fingerprint.eq(excluded(api_tokens::fingerprint)),
                api_tokens::created_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_user_by_token(
        &self,
        fingerprint: &TokenFingerprint,
    ) -> Result<Option<UserId>, TokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = api_tokens::table
            .filter(api_tokens::fingerprint.eq(fingerprint.as_str()))
            .select(api_tokens::user_id)
            .first::<uuid::Uuid>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(user.map(UserId::from))
    }
}
