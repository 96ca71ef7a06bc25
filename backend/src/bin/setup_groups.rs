#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
//! Provision the Viewers, Editors and Admins groups and optionally bootstrap
//! a staff superuser.
//!
//! # Examples
//! ```sh
//! cargo run --bin setup-groups -- --database-url postgres://localhost/library
//! LIBRARY_SUPERUSER_PASSWORD=... cargo run --bin setup-groups -- \
//!     --superuser admin --email admin@example.org
//! ```

use std::sync::Arc;

use backend::domain::{AccessAdministrationService, AccountService};
use backend::outbound::persistence::{
    DbPool, DieselGroupRepository, DieselTokenRepository, DieselUserRepository, PoolConfig,
    run_pending_migrations,
};
use clap::Parser;
use color_eyre::eyre::{Context, Result, bail, eyre};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

const SUPERUSER_PASSWORD_ENV: &str = "LIBRARY_SUPERUSER_PASSWORD";

/// `setup-groups` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "setup-groups",
    about = "Create or refresh the default permission groups",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `LIBRARY_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", env = "LIBRARY_DATABASE_URL")]
    database_url: String,
    /// Username of a staff superuser to create after provisioning.
    #[arg(long = "superuser", value_name = "username", requires = "email")]
    superuser: Option<String>,
    /// Email address of the superuser.
    #[arg(long = "email", value_name = "address", requires = "superuser")]
    email: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main(CliArgs::parse()))
}

async fn async_main(args: CliArgs) -> Result<()> {
    let database_url = args.database_url.trim();
    if database_url.is_empty() {
        bail!("database URL must not be empty");
    }
    run_pending_migrations(database_url)
        .await
        .wrap_err("apply database migrations")?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("create database pool")?;

    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let groups = Arc::new(DieselGroupRepository::new(pool.clone()));
    let administration = AccessAdministrationService::new(groups.clone(), users.clone());
    let summary = administration
        .provision()
        .await
        .map_err(|error| eyre!("group provisioning failed: {error}"))?;
    print!("{summary}");

    if let (Some(username), Some(email)) = (args.superuser, args.email) {
        let password = Zeroizing::new(
            std::env::var(SUPERUSER_PASSWORD_ENV)
                .wrap_err_with(|| format!("{SUPERUSER_PASSWORD_ENV} must hold the password"))?,
        );
        let accounts = AccountService::new(
            users,
            groups,
            Arc::new(DieselTokenRepository::new(pool)),
        );
        let account = accounts
            .create_superuser(&username, &email, &password)
            .await
            .map_err(|error| eyre!("superuser creation failed: {error}"))?;
        println!("Superuser {} created", account.user.username());
    }
    Ok(())
}
