//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (accounts,
//!   catalogue, roles, administration, token API, health)
//! - **Schemas**: catalogue and account entities plus the [`ErrorSchema`]
//!   wrappers that describe domain errors without coupling them to utoipa
//! - **Security**: the session cookie and API token schemes
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session and token schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
        components.add_security_scheme(
            "ApiToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` or `Bearer <key>`, issued by POST /api/token/.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Library catalogue API",
        description = "Books, authors, libraries and librarians behind a \
                       group-based permission gate.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_account,
        crate::inbound::http::accounts::update_current_account,
        crate::inbound::http::books::list_books,
        crate::inbound::http::books::get_book,
        crate::inbound::http::books::create_book,
        crate::inbound::http::books::update_book,
        crate::inbound::http::books::delete_book,
        crate::inbound::http::libraries::get_library,
        crate::inbound::http::libraries::create_library,
        crate::inbound::http::libraries::add_book,
        crate::inbound::http::libraries::assign_librarian,
        crate::inbound::http::roles::admin_view,
        crate::inbound::http::roles::librarian_view,
        crate::inbound::http::roles::member_view,
        crate::inbound::http::admin::provision_groups,
        crate::inbound::http::admin::add_user_to_group,
        crate::inbound::http::admin::set_user_role,
        crate::inbound::http::api::obtain_token,
        crate::inbound::http::api::book_list,
        crate::inbound::http::api::viewset_list,
        crate::inbound::http::api::viewset_retrieve,
        crate::inbound::http::api::viewset_create,
        crate::inbound::http::api::viewset_update,
        crate::inbound::http::api::viewset_destroy,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "accounts", description = "Registration, login and self-service"),
        (name = "books", description = "Permission-gated book catalogue"),
        (name = "libraries", description = "Libraries, holdings and librarians"),
        (name = "roles", description = "Views restricted to one profile role"),
        (name = "admin", description = "Staff-only group and role management"),
        (name = "api", description = "Token-authenticated REST surface"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
