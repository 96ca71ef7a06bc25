//! Cookie session access for handlers.
//!
//! Handlers only see the logged-in [`UserId`]; how it is stored stays here.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Session wrapper exposing login state.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record a successful login, rotating the session identifier.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Logged-in user, if any. Tampered ids are treated as logged out.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match UserId::new(&raw) {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Logged-in user or `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Forget the login.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    async fn login(session: SessionContext) -> Result<HttpResponse, Error> {
        let id = UserId::new(FIXTURE_ID).expect("fixture id");
        session.persist_user(&id)?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let id = session.require_user_id()?;
        Ok(HttpResponse::Ok().body(id.to_string()))
    }

    async fn logout(session: SessionContext) -> HttpResponse {
        session.clear();
        HttpResponse::NoContent().finish()
    }

    async fn tamper(session: Session) -> HttpResponse {
        session
            .insert(USER_ID_KEY, "not-a-uuid")
            .expect("insert tampered id");
        HttpResponse::Ok().finish()
    }

    macro_rules! session_app {
        () => {
            actix_test::init_service(
                App::new()
                    .wrap(test_session_middleware())
                    .route("/login", web::post().to(login))
                    .route("/whoami", web::get().to(whoami))
                    .route("/logout", web::post().to(logout))
                    .route("/tamper", web::post().to(tamper)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn login_round_trips_user_id() {
        let app = session_app!();
        let res = actix_test::call_service(&app, actix_test::TestRequest::post().uri("/login").to_request()).await;
        let cookie = session_cookie(&res).expect("session cookie");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, FIXTURE_ID);
    }

    #[actix_web::test]
    async fn anonymous_requests_are_unauthorised() {
        let app = session_app!();
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_ids_are_unauthorised() {
        let app = session_app!();
        let res = actix_test::call_service(&app, actix_test::TestRequest::post().uri("/tamper").to_request()).await;
        let cookie = session_cookie(&res).expect("session cookie");
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_expires_the_cookie() {
        let app = session_app!();
        let res = actix_test::call_service(&app, actix_test::TestRequest::post().uri("/login").to_request()).await;
        let cookie = session_cookie(&res).expect("session cookie");
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/logout").cookie(cookie).to_request(),
        )
        .await;
        let removal = session_cookie(&res).expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
