//! Builders wiring repositories into the HTTP state ports.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::info;

use backend::domain::ports::{CatalogueRepository, GroupRepository, TokenRepository, UserRepository};
use backend::domain::{AccessAdministrationService, AccountService, CatalogueService, Error};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::memory::InMemoryStore;
use backend::outbound::persistence::{
    DbPool, DieselCatalogueRepository, DieselGroupRepository, DieselTokenRepository,
    DieselUserRepository,
};

use super::ServerConfig;

/// Repository adapters backing one server instance.
struct Repositories<U, G, T, C> {
    users: Arc<U>,
    groups: Arc<G>,
    tokens: Arc<T>,
    catalogue: Arc<C>,
}

impl Repositories<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore> {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            groups: store.clone(),
            tokens: store.clone(),
            catalogue: store,
        }
    }
}

impl
    Repositories<
        DieselUserRepository,
        DieselGroupRepository,
        DieselTokenRepository,
        DieselCatalogueRepository,
    >
{
    fn postgres(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            groups: Arc::new(DieselGroupRepository::new(pool.clone())),
            tokens: Arc::new(DieselTokenRepository::new(pool.clone())),
            catalogue: Arc::new(DieselCatalogueRepository::new(pool.clone())),
        }
    }
}

impl<U, G, T, C> Repositories<U, G, T, C>
where
    U: UserRepository + 'static,
    G: GroupRepository + 'static,
    T: TokenRepository + 'static,
    C: CatalogueRepository + 'static,
{
    fn administration(&self) -> AccessAdministrationService<G, U> {
        AccessAdministrationService::new(self.groups.clone(), self.users.clone())
    }

    fn into_ports(self) -> HttpStatePorts {
        let administration = Arc::new(self.administration());
        let Self {
            users,
            groups,
            tokens,
            catalogue,
        } = self;
        let accounts = Arc::new(AccountService::new(users, groups, tokens));
        let catalogue = Arc::new(CatalogueService::new(catalogue, Arc::new(DefaultClock)));
        HttpStatePorts {
            login: accounts.clone(),
            registration: accounts.clone(),
            accounts: accounts.clone(),
            account_updates: accounts.clone(),
            identities: accounts.clone(),
            tokens: accounts,
            catalogue: catalogue.clone(),
            catalogue_commands: catalogue,
            administration,
        }
    }
}

/// Build the HTTP state from the configured storage.
///
/// A database pool selects the Diesel adapters; otherwise a fresh in-memory
/// store is used and the default groups are provisioned into it, since no
/// staff account exists yet to call the provisioning endpoint.
///
/// # Errors
/// Returns the domain [`Error`] raised while provisioning the in-memory
/// groups.
pub(super) async fn build_http_state(config: &ServerConfig) -> Result<HttpState, Error> {
    let ports = match &config.db_pool {
        Some(pool) => Repositories::postgres(pool).into_ports(),
        None => {
            let repositories = Repositories::in_memory();
            let summary = repositories.administration().provision().await?;
            info!(
                groups = summary.groups.len(),
                "provisioned default groups into the in-memory store"
            );
            repositories.into_ports()
        }
    };
    Ok(HttpState::new(ports))
}
