//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL via
//! `diesel-async` and `bb8` pooling.
//!
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//!   private to this module.
//! - Diesel and pool failures are classified once in
//!   `diesel_error_mapping` and mapped onto each port's error type.
//! - User writes and their profile hook share one transaction.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselCatalogueRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/library")).await?;
//! let catalogue = DieselCatalogueRepository::new(pool);
//! ```

mod diesel_catalogue_repository;
mod diesel_error_mapping;
mod diesel_group_repository;
mod diesel_token_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_catalogue_repository::DieselCatalogueRepository;
pub use diesel_group_repository::DieselGroupRepository;
pub use diesel_token_repository::DieselTokenRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
