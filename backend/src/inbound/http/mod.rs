//! HTTP inbound adapter exposing REST endpoints.
//!
//! Two surfaces share the same domain ports:
//! - the session surface (mounted under `/api/v1`) authenticates with a
//!   private session cookie;
//! - the token surface (mounted under `/api`) authenticates with an
//!   `Authorization: Token <key>` header.
//!
//! Mount the session surface first: the `/api` scope would otherwise claim
//! every `/api/v1` path.

use actix_web::web;

pub mod accounts;
pub mod admin;
pub mod api;
pub mod books;
pub mod error;
pub mod health;
pub mod identity;
pub mod libraries;
pub mod payload;
pub mod roles;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Register the cookie-session handlers on `cfg`.
///
/// The caller wraps the enclosing scope with the session middleware.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use backend::inbound::http::configure_session_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_session_api));
/// ```
pub fn configure_session_api(cfg: &mut web::ServiceConfig) {
    payload::configure_extractors(cfg);
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::logout)
        .service(accounts::current_account)
        .service(accounts::update_current_account)
        .service(books::list_books)
        .service(books::get_book)
        .service(books::create_book)
        .service(books::update_book)
        .service(books::delete_book)
        .service(libraries::get_library)
        .service(libraries::create_library)
        .service(libraries::add_book)
        .service(libraries::assign_librarian)
        .service(roles::admin_view)
        .service(roles::librarian_view)
        .service(roles::member_view)
        .service(admin::provision_groups)
        .service(admin::add_user_to_group)
        .service(admin::set_user_role);
}

/// Register the token-authenticated handlers on `cfg`.
pub fn configure_token_api(cfg: &mut web::ServiceConfig) {
    payload::configure_extractors(cfg);
    cfg.service(api::obtain_token)
        .service(api::book_list)
        .service(api::viewset_list)
        .service(api::viewset_retrieve)
        .service(api::viewset_create)
        .service(api::viewset_update)
        .service(api::viewset_destroy);
}
