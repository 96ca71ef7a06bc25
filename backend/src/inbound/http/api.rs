//! Token-authenticated REST surface.
//!
//! Clients exchange credentials for a token at `POST /api/token/` and send it
//! back as `Authorization: Token <key>`. Reads need any authenticated
//! identity; writes through the `books_all` viewset need staff.
//!
//! ```text
//! POST /api/token/ {"username":"ada@example.com","password":"correct horse"}
//! GET /api/books_all/ (Authorization: Token 3f0c...)
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Book, BookFilter, BookId, CatalogueOperation, LoginCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts::{LoginRequest, map_login_validation_error};
use crate::inbound::http::books::BookRequest;
use crate::inbound::http::identity::TokenActor;
use crate::inbound::http::payload::DeferredJson;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Freshly issued API token. Any previous token for the account stops working.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b")]
    pub token: String,
}

/// Exchange credentials for an API token.
///
/// `username` takes the account email or its username.
#[utoipa::path(
    post,
    path = "/api/token/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "obtainToken",
    security([])
)]
#[post("/token/")]
pub async fn obtain_token(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let key = state.tokens.issue_token(&credentials).await?;
    Ok(web::Json(TokenResponse {
        token: key.expose().to_owned(),
    }))
}

async fn all_books(state: &HttpState, TokenActor(actor): TokenActor) -> ApiResult<web::Json<Vec<Book>>> {
    let books = state
        .catalogue
        .list_books(&actor, &BookFilter::default())
        .await?;
    Ok(web::Json(books))
}

/// Read-only book list.
#[utoipa::path(
    get,
    path = "/api/books/",
    responses(
        (status = 200, description = "Books", body = [Book]),
        (status = 401, description = "Token required", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "apiListBooks",
    security(("ApiToken" = []))
)]
#[get("/books/")]
pub async fn book_list(
    state: web::Data<HttpState>,
    actor: TokenActor,
) -> ApiResult<web::Json<Vec<Book>>> {
    all_books(&state, actor).await
}

/// Viewset list.
#[utoipa::path(
    get,
    path = "/api/books_all/",
    responses(
        (status = 200, description = "Books", body = [Book]),
        (status = 401, description = "Token required", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "apiBooksAllList",
    security(("ApiToken" = []))
)]
#[get("/books_all/")]
pub async fn viewset_list(
    state: web::Data<HttpState>,
    actor: TokenActor,
) -> ApiResult<web::Json<Vec<Book>>> {
    all_books(&state, actor).await
}

/// Viewset retrieve.
#[utoipa::path(
    get,
    path = "/api/books_all/{id}/",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 401, description = "Token required", body = ErrorSchema),
        (status = 404, description = "No such book", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "apiBooksAllRetrieve",
    security(("ApiToken" = []))
)]
#[get("/books_all/{id}/")]
pub async fn viewset_retrieve(
    state: web::Data<HttpState>,
    TokenActor(actor): TokenActor,
    id: web::Path<i64>,
) -> ApiResult<web::Json<Book>> {
    let book = state
        .catalogue
        .get_book(&actor, BookId::new(id.into_inner()))
        .await?;
    Ok(web::Json(book))
}

/// Viewset create. Staff only.
#[utoipa::path(
    post,
    path = "/api/books_all/",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Created", body = Book),
        (status = 400, description = "Validation failed", body = ErrorSchema),
        (status = 403, description = "Staff required", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "apiBooksAllCreate",
    security(("ApiToken" = []))
)]
#[post("/books_all/")]
pub async fn viewset_create(
    state: web::Data<HttpState>,
    TokenActor(actor): TokenActor,
    payload: DeferredJson<BookRequest>,
) -> ApiResult<HttpResponse> {
    actor.authorize(CatalogueOperation::CreateBook)?;
    let form = payload.decode()?.into();
    let book = state.catalogue_commands.create_book(&actor, form).await?;
    Ok(HttpResponse::Created().json(book))
}

/// Viewset update. Staff only.
#[utoipa::path(
    put,
    path = "/api/books_all/{id}/",
    params(("id" = i64, Path, description = "Book id")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Updated", body = Book),
        (status = 400, description = "Validation failed", body = ErrorSchema),
        (status = 403, description = "Staff required", body = ErrorSchema),
        (status = 404, description = "No such book", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "apiBooksAllUpdate",
    security(("ApiToken" = []))
)]
#[put("/books_all/{id}/")]
pub async fn viewset_update(
    state: web::Data<HttpState>,
    TokenActor(actor): TokenActor,
    id: web::Path<i64>,
    payload: DeferredJson<BookRequest>,
) -> ApiResult<web::Json<Book>> {
    actor.authorize(CatalogueOperation::EditBook)?;
    let form = payload.decode()?.into();
    let book = state
        .catalogue_commands
        .update_book(&actor, BookId::new(id.into_inner()), form)
        .await?;
    Ok(web::Json(book))
}

/// Viewset destroy. Staff only.
#[utoipa::path(
    delete,
    path = "/api/books_all/{id}/",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Staff required", body = ErrorSchema),
        (status = 404, description = "No such book", body = ErrorSchema)
    ),
    tags = ["api"],
    operation_id = "apiBooksAllDestroy",
    security(("ApiToken" = []))
)]
#[delete("/books_all/{id}/")]
pub async fn viewset_destroy(
    state: web::Data<HttpState>,
    TokenActor(actor): TokenActor,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .catalogue_commands
        .delete_book(&actor, BookId::new(id.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
