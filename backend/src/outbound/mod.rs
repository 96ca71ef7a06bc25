//! Outbound adapters implementing the repository ports.
//!
//! - **memory**: process-local store used by tests and database-less runs.
//! - **persistence**: PostgreSQL repositories using Diesel.
//!
//! Adapters only translate between domain types and storage representations.

pub mod memory;
pub mod persistence;
