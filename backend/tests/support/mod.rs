//! Shared harness for HTTP integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so the
//! app wiring lives here once. Every harness owns a fresh in-memory store with
//! the default groups provisioned.

#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use mockable::DefaultClock;
use serde_json::{Value, json};
use zeroize::Zeroizing;

use backend::domain::ports::{AccountRegistration, GroupRepository};
use backend::domain::{
    AccessAdministrationService, AccountService, CatalogueService, GroupName, RegistrationForm,
    UserId,
};
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::inbound::http::{configure_session_api, configure_token_api};
use backend::outbound::memory::InMemoryStore;
use backend::{SecurityHeaders, Trace};

pub const PASSWORD: &str = "correct horse battery";

pub type Accounts = AccountService<InMemoryStore, InMemoryStore, InMemoryStore>;
pub type Administration = AccessAdministrationService<InMemoryStore, InMemoryStore>;

/// Services and state sharing one in-memory store.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub accounts: Arc<Accounts>,
    pub administration: Arc<Administration>,
    pub state: web::Data<HttpState>,
}

impl Harness {
    /// Build a harness whose store holds the provisioned default groups.
    pub async fn provisioned() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let accounts = Arc::new(AccountService::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let administration = Arc::new(AccessAdministrationService::new(
            store.clone(),
            store.clone(),
        ));
        administration
            .provision()
            .await
            .expect("default groups provision");
        let catalogue = Arc::new(CatalogueService::new(store.clone(), Arc::new(DefaultClock)));
        let state = web::Data::new(HttpState::new(HttpStatePorts {
            login: accounts.clone(),
            registration: accounts.clone(),
            accounts: accounts.clone(),
            account_updates: accounts.clone(),
            identities: accounts.clone(),
            tokens: accounts.clone(),
            catalogue: catalogue.clone(),
            catalogue_commands: catalogue,
            administration: administration.clone(),
        }));
        Self {
            store,
            accounts,
            administration,
            state,
        }
    }

    /// Create a staff superuser named `username`.
    pub async fn superuser(&self, username: &str) -> UserId {
        self.accounts
            .create_superuser(username, &format!("{username}@example.org"), PASSWORD)
            .await
            .expect("superuser is created")
            .user
            .id()
            .clone()
    }

    /// Register a member and add them to `group`, if any.
    pub async fn member(&self, username: &str, group: Option<&str>) -> UserId {
        let account = self
            .accounts
            .register(RegistrationForm {
                username: username.to_owned(),
                email: format!("{username}@example.org"),
                password: Zeroizing::new(PASSWORD.to_owned()),
                password_confirmation: Zeroizing::new(PASSWORD.to_owned()),
                date_of_birth: None,
                profile_photo: None,
            })
            .await
            .expect("member registers");
        let id = account.user.id().clone();
        if let Some(group) = group {
            let name = GroupName::new(group).expect("valid group name");
            self.store
                .add_member(&name, &id)
                .await
                .expect("membership is stored");
        }
        id
    }

    /// The application as wired by the server, with a throwaway session key.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        App::new()
            .app_data(health)
            .app_data(self.state.clone())
            .wrap(SecurityHeaders)
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session)
                    .configure(configure_session_api),
            )
            .service(web::scope("/api").configure(configure_token_api))
            .service(ready)
            .service(live)
    }
}

/// Log `username` in through the session surface and return the cookie.
pub async fn login<S>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "username": username, "password": PASSWORD }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("login sets a session cookie")
}

/// Exchange credentials for an API token.
pub async fn token<S>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let body: Value = actix_test::call_and_read_body_json(
        app,
        actix_test::TestRequest::post()
            .uri("/api/token/")
            .set_json(json!({ "username": username, "password": PASSWORD }))
            .to_request(),
    )
    .await;
    body["token"].as_str().expect("token in body").to_owned()
}

/// Titles of a JSON book list, in response order.
pub fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("book list")
        .iter()
        .map(|book| book["title"].as_str().expect("title").to_owned())
        .collect()
}
