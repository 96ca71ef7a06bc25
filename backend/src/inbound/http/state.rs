//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only ever talk to driving
//! ports, so they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccessAdministration, AccountCommand, AccountQuery, AccountRegistration, CatalogueCommand,
    CatalogueQuery, IdentityResolver, LoginService, TokenIssuer,
};

/// Parameter object bundling every port the HTTP adapter calls.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn AccountRegistration>,
    pub accounts: Arc<dyn AccountQuery>,
    pub account_updates: Arc<dyn AccountCommand>,
    pub identities: Arc<dyn IdentityResolver>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub catalogue: Arc<dyn CatalogueQuery>,
    pub catalogue_commands: Arc<dyn CatalogueCommand>,
    pub administration: Arc<dyn AccessAdministration>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn AccountRegistration>,
    pub accounts: Arc<dyn AccountQuery>,
    pub account_updates: Arc<dyn AccountCommand>,
    pub identities: Arc<dyn IdentityResolver>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub catalogue: Arc<dyn CatalogueQuery>,
    pub catalogue_commands: Arc<dyn CatalogueCommand>,
    pub administration: Arc<dyn AccessAdministration>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::{AccessAdministrationService, AccountService, CatalogueService};
    /// use backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use backend::outbound::memory::InMemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let accounts = Arc::new(AccountService::new(store.clone(), store.clone(), store.clone()));
    /// let catalogue = Arc::new(CatalogueService::new(store.clone(), Arc::new(DefaultClock)));
    /// let state = HttpState::new(HttpStatePorts {
    ///     login: accounts.clone(),
    ///     registration: accounts.clone(),
    ///     accounts: accounts.clone(),
    ///     account_updates: accounts.clone(),
    ///     identities: accounts.clone(),
    ///     tokens: accounts,
    ///     catalogue: catalogue.clone(),
    ///     catalogue_commands: catalogue,
    ///     administration: Arc::new(AccessAdministrationService::new(store.clone(), store)),
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            registration,
            accounts,
            account_updates,
            identities,
            tokens,
            catalogue,
            catalogue_commands,
            administration,
        } = ports;
        Self {
            login,
            registration,
            accounts,
            account_updates,
            identities,
            tokens,
            catalogue,
            catalogue_commands,
            administration,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
