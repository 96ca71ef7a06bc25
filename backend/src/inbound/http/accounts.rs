//! Account handlers: registration, login and the caller's own profile.
//!
//! ```text
//! POST /api/v1/register {"username":"ada","email":"ada@example.com",...}
//! POST /api/v1/login {"username":"ada@example.com","password":"correct horse"}
//! POST /api/v1/logout
//! GET /api/v1/me
//! PATCH /api/v1/me {"email":"ada@example.org"}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{
    AccountUpdateForm, AccountView, Error, LoginCredentials, LoginValidationError,
    RegistrationForm,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::payload::DeferredJson;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration request body.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[schema(format = Date, example = "1815-12-10")]
    pub date_of_birth: Option<String>,
    #[schema(example = "profile_photos/ada.png")]
    pub profile_photo: Option<String>,
}

impl From<RegisterRequest> for RegistrationForm {
    fn from(value: RegisterRequest) -> Self {
        Self {
            username: value.username,
            email: value.email,
            password: Zeroizing::new(value.password),
            password_confirmation: Zeroizing::new(value.password_confirmation),
            date_of_birth: value.date_of_birth,
            profile_photo: value.profile_photo,
        }
    }
}

/// Login request body.
///
/// `username` takes the account email or its username; `email` is accepted
/// as an alias for the same field.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "email")]
    #[schema(example = "ada@example.com")]
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        let password = Zeroizing::new(value.password);
        Self::try_from_parts(&value.username, &password)
    }
}

/// Self-service changes; absent fields stay as they are.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    #[schema(format = Date)]
    pub date_of_birth: Option<String>,
    pub profile_photo: Option<String>,
}

impl From<UpdateAccountRequest> for AccountUpdateForm {
    fn from(value: UpdateAccountRequest) -> Self {
        Self {
            email: value.email,
            date_of_birth: value.date_of_birth,
            profile_photo: value.profile_photo,
        }
    }
}

pub(crate) fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Create an account with a Member profile and log it in.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView),
        (status = 400, description = "Validation failed", body = ErrorSchema),
        (status = 409, description = "Username or email taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let account = state
        .registration
        .register(payload.into_inner().into())
        .await?;
    session.persist_user(account.user.id())?;
    Ok(HttpResponse::Created().json(account))
}

/// Authenticate by email or username and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Logged out")),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// The caller's account and profile role.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current account", body = AccountView),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "currentAccount"
)]
#[get("/me")]
pub async fn current_account(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AccountView>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.accounts.account(&user_id).await?))
}

/// Update the caller's account. The profile is re-synced afterwards.
#[utoipa::path(
    patch,
    path = "/api/v1/me",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountView),
        (status = 400, description = "Validation failed", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 409, description = "Email taken", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "updateCurrentAccount"
)]
#[patch("/me")]
pub async fn update_current_account(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: DeferredJson<UpdateAccountRequest>,
) -> ApiResult<web::Json<AccountView>> {
    let user_id = session.require_user_id()?;
    let update = payload.decode()?.into();
    let view = state
        .account_updates
        .update_account(&user_id, update)
        .await?;
    Ok(web::Json(view))
}
