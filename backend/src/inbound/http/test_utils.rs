//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test as actix_test, web};
use std::sync::Arc;

use crate::domain::ports::{
    MockAccessAdministration, MockAccountCommand, MockAccountQuery, MockAccountRegistration,
    MockCatalogueCommand, MockCatalogueQuery, MockIdentityResolver, MockLoginService,
    MockTokenIssuer,
};
use crate::domain::{AccountFlags, Capability, Identity, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Path of the [`test_login`] route mounted by handler tests.
pub const TEST_LOGIN_PATH: &str = "/test-login";

/// Session middleware with a fresh key and a non-secure `session` cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// Log a random user in; identity resolution is left to the mocks.
pub async fn test_login(session: SessionContext) -> Result<HttpResponse, crate::domain::Error> {
    session.persist_user(&UserId::random())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Call [`TEST_LOGIN_PATH`] and return the session cookie it sets.
pub async fn login_cookie<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let res = actix_test::call_service(app, actix_test::TestRequest::post().uri(TEST_LOGIN_PATH).to_request())
        .await;
    session_cookie(&res).expect("test login sets a session cookie")
}

/// Identity of an active, non-staff account holding `granted`.
pub fn member_identity(granted: &[Capability]) -> Identity {
    Identity::new(
        UserId::random(),
        AccountFlags::member(),
        None,
        granted.iter().copied().collect(),
    )
}

/// Mocked ports; set expectations on the fields, then [`StateBuilder::build`].
#[derive(Default)]
pub struct StateBuilder {
    pub login: MockLoginService,
    pub registration: MockAccountRegistration,
    pub accounts: MockAccountQuery,
    pub account_updates: MockAccountCommand,
    pub identities: MockIdentityResolver,
    pub tokens: MockTokenIssuer,
    pub catalogue: MockCatalogueQuery,
    pub catalogue_commands: MockCatalogueCommand,
    pub administration: MockAccessAdministration,
}

impl StateBuilder {
    pub fn build(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            login: Arc::new(self.login),
            registration: Arc::new(self.registration),
            accounts: Arc::new(self.accounts),
            account_updates: Arc::new(self.account_updates),
            identities: Arc::new(self.identities),
            tokens: Arc::new(self.tokens),
            catalogue: Arc::new(self.catalogue),
            catalogue_commands: Arc::new(self.catalogue_commands),
            administration: Arc::new(self.administration),
        }))
    }

    /// Resolve every request's token to `identity`.
    pub fn with_token_identity(mut self, identity: Identity) -> Self {
        self.identities
            .expect_resolve_token()
            .returning(move |_| Ok(Some(identity.clone())));
        self
    }

    /// Resolve every session user to `identity`.
    pub fn with_session_identity(mut self, identity: Identity) -> Self {
        self.identities
            .expect_resolve_user()
            .returning(move |_| Ok(Some(identity.clone())));
        self
    }
}
