//! Session-authenticated library endpoints.
//!
//! Viewing a library needs `can_view`; creating one, adding holdings and
//! assigning its librarian need `can_edit`.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    BookId, CatalogueOperation, Librarian, LibrarianForm, Library, LibraryDetail, LibraryForm,
    LibraryId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::SessionActor;
use crate::inbound::http::payload::DeferredJson;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Library or librarian body; both only carry a name.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct NameRequest {
    #[schema(example = "Central Library")]
    pub name: String,
}

/// Holding to add to a library.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRequest {
    #[schema(example = 1)]
    pub book_id: i64,
}

/// Library with its holdings and librarian.
#[utoipa::path(
    get,
    path = "/api/v1/libraries/{id}",
    params(("id" = i64, Path, description = "Library id")),
    responses(
        (status = 200, description = "Library", body = LibraryDetail),
        (status = 403, description = "can_view required", body = ErrorSchema),
        (status = 404, description = "No such library", body = ErrorSchema)
    ),
    tags = ["libraries"],
    operation_id = "getLibrary"
)]
#[get("/libraries/{id}")]
pub async fn get_library(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
    id: web::Path<i64>,
) -> ApiResult<web::Json<LibraryDetail>> {
    let detail = state
        .catalogue
        .get_library(&actor, LibraryId::new(id.into_inner()))
        .await?;
    Ok(web::Json(detail))
}

/// Create a library.
#[utoipa::path(
    post,
    path = "/api/v1/libraries",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Created", body = Library),
        (status = 400, description = "Validation failed", body = ErrorSchema),
        (status = 403, description = "can_edit required", body = ErrorSchema)
    ),
    tags = ["libraries"],
    operation_id = "createLibrary"
)]
#[post("/libraries")]
pub async fn create_library(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
    payload: DeferredJson<NameRequest>,
) -> ApiResult<HttpResponse> {
    actor.authorize(CatalogueOperation::ManageLibrary)?;
    let form = LibraryForm {
        name: payload.decode()?.name,
    };
    let library = state.catalogue_commands.create_library(&actor, form).await?;
    Ok(HttpResponse::Created().json(library))
}

/// Add a book to a library's holdings. Adding it twice is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/libraries/{id}/books",
    params(("id" = i64, Path, description = "Library id")),
    request_body = HoldingRequest,
    responses(
        (status = 200, description = "Library after the change", body = LibraryDetail),
        (status = 403, description = "can_edit required", body = ErrorSchema),
        (status = 404, description = "No such library or book", body = ErrorSchema)
    ),
    tags = ["libraries"],
    operation_id = "addLibraryBook"
)]
#[post("/libraries/{id}/books")]
pub async fn add_book(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
    id: web::Path<i64>,
    payload: DeferredJson<HoldingRequest>,
) -> ApiResult<web::Json<LibraryDetail>> {
    actor.authorize(CatalogueOperation::ManageLibrary)?;
    let holding = payload.decode()?;
    let detail = state
        .catalogue_commands
        .attach_book(
            &actor,
            LibraryId::new(id.into_inner()),
            BookId::new(holding.book_id),
        )
        .await?;
    Ok(web::Json(detail))
}

/// Assign the library's librarian. A library has at most one.
#[utoipa::path(
    put,
    path = "/api/v1/libraries/{id}/librarian",
    params(("id" = i64, Path, description = "Library id")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Assigned", body = Librarian),
        (status = 400, description = "Validation failed", body = ErrorSchema),
        (status = 403, description = "can_edit required", body = ErrorSchema),
        (status = 404, description = "No such library", body = ErrorSchema),
        (status = 409, description = "Library already has a librarian", body = ErrorSchema)
    ),
    tags = ["libraries"],
    operation_id = "assignLibrarian"
)]
#[put("/libraries/{id}/librarian")]
pub async fn assign_librarian(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
    id: web::Path<i64>,
    payload: DeferredJson<NameRequest>,
) -> ApiResult<web::Json<Librarian>> {
    actor.authorize(CatalogueOperation::ManageLibrary)?;
    let form = LibrarianForm {
        name: payload.decode()?.name,
    };
    let librarian = state
        .catalogue_commands
        .assign_librarian(&actor, LibraryId::new(id.into_inner()), form)
        .await?;
    Ok(web::Json(librarian))
}
