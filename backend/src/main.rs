//! Backend entry-point: loads configuration, wires storage, and serves the
//! REST surfaces with OpenAPI docs.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use backend::settings::ServerSettings;
use ortho_config::OrthoConfig;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().wrap_err("failed to load server settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %session.key_fingerprint(),
        cookie_secure = session.cookie_secure,
        "session key loaded"
    );

    let mut config = ServerConfig::new(session, settings.bind_addr());
    match settings.database_url() {
        Some(url) => {
            if settings.run_migrations() {
                run_pending_migrations(url)
                    .await
                    .wrap_err("failed to apply database migrations")?;
            }
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .wrap_err("failed to build database pool")?;
            config = config.with_db_pool(pool);
        }
        None => warn!("no database configured; state is kept in memory"),
    }

    info!(addr = %config.bind_addr(), "starting HTTP server");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).await?;
    server.await?;
    Ok(())
}
