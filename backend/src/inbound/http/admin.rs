//! Staff-only access administration.
//!
//! ```text
//! POST /api/v1/admin/groups/provision
//! POST /api/v1/admin/users/{id}/groups {"group":"Editors"}
//! PUT /api/v1/admin/users/{id}/role {"role":"Librarian"}
//! ```

use actix_web::{HttpResponse, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Error, GroupName, ProvisioningSummary, Requirement, Role, UserId, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::SessionActor;
use crate::inbound::http::payload::DeferredJson;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Group membership to add.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct GroupMembershipRequest {
    #[schema(example = "Editors")]
    pub group: String,
}

/// Profile role to set.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RoleRequest {
    #[schema(example = "Librarian")]
    pub role: String,
}

fn field_error(field: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field }))
}

fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| field_error("id", err.to_string()))
}

/// Create or refresh the Viewers, Editors and Admins groups.
#[utoipa::path(
    post,
    path = "/api/v1/admin/groups/provision",
    responses(
        (status = 200, description = "Per-group outcome and grants", body = ProvisioningSummary),
        (status = 403, description = "Staff required", body = ErrorSchema),
        (status = 500, description = "Registry misconfigured", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "provisionGroups"
)]
#[post("/admin/groups/provision")]
pub async fn provision_groups(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
) -> ApiResult<web::Json<ProvisioningSummary>> {
    Ok(web::Json(state.administration.provision_groups(&actor).await?))
}

/// Add a user to a group.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/groups",
    params(("id" = String, Path, description = "User id")),
    request_body = GroupMembershipRequest,
    responses(
        (status = 204, description = "Member added"),
        (status = 400, description = "Malformed id or group", body = ErrorSchema),
        (status = 403, description = "Staff required", body = ErrorSchema),
        (status = 404, description = "Unknown user or group", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "addUserToGroup"
)]
#[post("/admin/users/{id}/groups")]
pub async fn add_user_to_group(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
    id: web::Path<String>,
    payload: DeferredJson<GroupMembershipRequest>,
) -> ApiResult<HttpResponse> {
    actor.require(Requirement::Staff)?;
    let user_id = parse_user_id(&id)?;
    let group = GroupName::new(&payload.decode()?.group)
        .map_err(|err| field_error("group", err.to_string()))?;
    state
        .administration
        .assign_group(&actor, &user_id, &group)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Change a user's profile role.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = String, Path, description = "User id")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Malformed id or role", body = ErrorSchema),
        (status = 403, description = "Staff required", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "setUserRole"
)]
#[put("/admin/users/{id}/role")]
pub async fn set_user_role(
    state: web::Data<HttpState>,
    SessionActor(actor): SessionActor,
    id: web::Path<String>,
    payload: DeferredJson<RoleRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    actor.require(Requirement::Staff)?;
    let user_id = parse_user_id(&id)?;
    let role = payload
        .decode()?
        .role
        .parse::<Role>()
        .map_err(|err| field_error("role", err.to_string()))?;
    let profile = state
        .administration
        .assign_role(&actor, &user_id, role)
        .await?;
    Ok(web::Json(profile))
}
