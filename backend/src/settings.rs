//! Server configuration loaded via OrthoConfig.
//!
//! Values come from `LIBRARY_*` environment variables, matching command-line
//! flags, or a configuration file. Session cookie settings are read
//! separately by [`crate::inbound::http::session_config`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;

/// Storage and listener settings for the catalogue server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LIBRARY")]
pub struct ServerSettings {
    /// Interface to bind; defaults to every IPv4 interface.
    pub host: Option<IpAddr>,
    /// TCP port to bind.
    pub port: Option<u16>,
    /// PostgreSQL URL. Without one the server keeps state in memory.
    pub database_url: Option<String>,
    /// Leave the schema untouched at startup.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
}

impl ServerSettings {
    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Whether migrations run at startup when a database is configured.
    pub fn run_migrations(&self) -> bool {
        !self.skip_migrations
    }
}
