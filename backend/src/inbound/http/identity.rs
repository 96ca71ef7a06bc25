//! Request extractors that resolve the acting identity.
//!
//! Session endpoints read the user id from the cookie; REST endpoints read an
//! API token from `Authorization`. Either way the identity, and with it the
//! current group grants, is looked up fresh on every request.

use actix_session::SessionExt;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{AccessSurface, Actor, ApiTokenKey, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const TOKEN_SCHEMES: [&str; 2] = ["Token", "Bearer"];

fn http_state(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))
}

/// Actor behind a cookie session, gated by capabilities.
///
/// Requests without a login yield an anonymous actor; the gate rejects it
/// with `401` when an operation needs an identity.
#[derive(Debug, Clone)]
pub struct SessionActor(pub Actor);

impl FromRequest for SessionActor {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = http_state(req);
        let session = SessionContext::new(req.get_session());
        Box::pin(async move {
            let state = state?;
            let identity = match session.user_id()? {
                Some(user_id) => state.identities.resolve_user(&user_id).await?,
                None => None,
            };
            Ok(Self(Actor::new(identity, AccessSurface::Catalogue)))
        })
    }
}

/// Actor presenting an API token, gated by authentication and staff status.
///
/// A missing header yields an anonymous actor. A header naming a key this
/// service never issued, or one owned by a deactivated account, is rejected
/// outright.
#[derive(Debug, Clone)]
pub struct TokenActor(pub Actor);

/// Split `Authorization: Token <key>` (or `Bearer <key>`).
///
/// `Some(None)` means a token header was sent but could not be a key.
fn presented_key(req: &HttpRequest) -> Option<Option<ApiTokenKey>> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = header.trim().split_once(' ')?;
    TOKEN_SCHEMES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(scheme))
        .then(|| ApiTokenKey::parse(key))
}

impl FromRequest for TokenActor {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = http_state(req);
        let presented = presented_key(req);
        Box::pin(async move {
            let state = state?;
            let identity = match presented {
                None => None,
                Some(None) => return Err(Error::unauthorized("Invalid token.")),
                Some(Some(key)) => {
                    let identity = state
                        .identities
                        .resolve_token(&key)
                        .await?
                        .ok_or_else(|| Error::unauthorized("Invalid token."))?;
                    if !identity.flags().is_active {
                        return Err(Error::unauthorized("User inactive or deleted."));
                    }
                    Some(identity)
                }
            };
            Ok(Self(Actor::new(identity, AccessSurface::RestApi)))
        })
    }
}
