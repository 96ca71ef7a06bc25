//! Request extraction that keeps the access gate ahead of body parsing.
//!
//! State-changing handlers take a [`DeferredJson`] body, admit the caller and
//! only then decode it, so a caller without access learns nothing about the
//! shape the endpoint expects. Every other extractor failure is reported as
//! a domain [`Error`] through the configs registered by
//! [`configure_extractors`].

use std::marker::PhantomData;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::Error;

fn malformed(kind: &str, message: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("malformed request {kind}: {message}"))
        .with_details(json!({ "code": format!("malformed_{kind}") }))
}

/// JSON body read with the request but decoded on demand.
///
/// # Examples
/// ```ignore
/// actor.authorize(CatalogueOperation::CreateBook)?;
/// let form: BookForm = payload.decode()?.into();
/// ```
pub struct DeferredJson<T> {
    body: web::Bytes,
    target: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> DeferredJson<T> {
    /// Decode the body; `400` with the domain error shape when it does not fit.
    pub fn decode(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|err| malformed("body", err))
    }
}

impl<T> FromRequest for DeferredJson<T> {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let body = body.await.map_err(|err| malformed("body", err))?;
            Ok(Self {
                body,
                target: PhantomData,
            })
        })
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("body", err).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("query", err).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    malformed("path", err).into()
}

/// Report `Json`, `Query` and `Path` extraction failures as domain errors.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error));
}
