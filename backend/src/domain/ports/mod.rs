//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by outbound adapters; driving
//! ports are implemented by the domain services and called by inbound
//! adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod access_administration;
mod account_ports;
mod catalogue_ports;
mod catalogue_repository;
mod group_repository;
mod identity_ports;
mod login_service;
mod token_repository;
mod user_repository;

#[cfg(test)]
pub use access_administration::MockAccessAdministration;
pub use access_administration::AccessAdministration;
#[cfg(test)]
pub use account_ports::{MockAccountCommand, MockAccountQuery, MockAccountRegistration};
pub use account_ports::{AccountCommand, AccountQuery, AccountRegistration};
#[cfg(test)]
pub use catalogue_ports::{MockCatalogueCommand, MockCatalogueQuery};
pub use catalogue_ports::{CatalogueCommand, CatalogueQuery};
#[cfg(test)]
pub use catalogue_repository::MockCatalogueRepository;
pub use catalogue_repository::{CatalogueRepository, CatalogueRepositoryError};
#[cfg(test)]
pub use group_repository::MockGroupRepository;
pub use group_repository::{GroupRepository, GroupRepositoryError};
#[cfg(test)]
pub use identity_ports::{MockIdentityResolver, MockTokenIssuer};
pub use identity_ports::{IdentityResolver, TokenIssuer};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
pub use token_repository::{TokenRepository, TokenRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
