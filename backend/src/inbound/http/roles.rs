//! Role-gated dashboards.
//!
//! These views check the caller's profile role rather than group
//! capabilities; a Member cannot open the Admin dashboard even if their
//! groups grant every book capability.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Actor, Error, Requirement, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::SessionActor;
use crate::inbound::http::schemas::ErrorSchema;

/// Dashboard payload for a role.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleDashboard {
    pub role: Role,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub user_id: String,
}

fn dashboard(actor: &Actor, role: Role) -> ApiResult<web::Json<RoleDashboard>> {
    actor.require(Requirement::Role(role))?;
    let identity = actor
        .identity()
        .ok_or_else(|| Error::unauthorized("login required"))?;
    Ok(web::Json(RoleDashboard {
        role,
        user_id: identity.user_id().to_string(),
    }))
}

/// Admin dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/roles/admin",
    responses(
        (status = 200, description = "Dashboard", body = RoleDashboard),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "adminDashboard"
)]
#[get("/roles/admin")]
pub async fn admin_view(SessionActor(actor): SessionActor) -> ApiResult<web::Json<RoleDashboard>> {
    dashboard(&actor, Role::Admin)
}

/// Librarian dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/roles/librarian",
    responses(
        (status = 200, description = "Dashboard", body = RoleDashboard),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Librarian role required", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "librarianDashboard"
)]
#[get("/roles/librarian")]
pub async fn librarian_view(
    SessionActor(actor): SessionActor,
) -> ApiResult<web::Json<RoleDashboard>> {
    dashboard(&actor, Role::Librarian)
}

/// Member dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/roles/member",
    responses(
        (status = 200, description = "Dashboard", body = RoleDashboard),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Member role required", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "memberDashboard"
)]
#[get("/roles/member")]
pub async fn member_view(SessionActor(actor): SessionActor) -> ApiResult<web::Json<RoleDashboard>> {
    dashboard(&actor, Role::Member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountFlags, Capability, CapabilitySet, Identity, UserId};
    use crate::inbound::http::test_utils::{
        StateBuilder, TEST_LOGIN_PATH, login_cookie, test_login, test_session_middleware,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    fn with_role(role: Role, granted: CapabilitySet) -> Identity {
        Identity::new(UserId::random(), AccountFlags::member(), Some(role), granted)
    }

    #[rstest]
    #[case(Role::Admin, "/api/v1/roles/admin", StatusCode::OK)]
    #[case(Role::Librarian, "/api/v1/roles/librarian", StatusCode::OK)]
    #[case(Role::Member, "/api/v1/roles/member", StatusCode::OK)]
    #[case(Role::Member, "/api/v1/roles/admin", StatusCode::FORBIDDEN)]
    #[case(Role::Librarian, "/api/v1/roles/member", StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn dashboards_require_the_exact_role(
        #[case] role: Role,
        #[case] uri: &str,
        #[case] expected: StatusCode,
    ) {
        let builder = StateBuilder::default().with_session_identity(with_role(
            role,
            [Capability::View, Capability::Delete].into_iter().collect(),
        ));
        let app = actix_test::init_service(
            App::new()
                .app_data(builder.build())
                .wrap(test_session_middleware())
                .route(TEST_LOGIN_PATH, web::post().to(test_login))
                .service(
                    web::scope("/api/v1")
                        .service(admin_view)
                        .service(librarian_view)
                        .service(member_view),
                ),
        )
        .await;
        let cookie = login_cookie(&app).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(uri).cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn anonymous_dashboard_is_unauthorised() {
        let app = actix_test::init_service(
            App::new()
                .app_data(StateBuilder::default().build())
                .wrap(test_session_middleware())
                .service(member_view),
        )
        .await;
        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/roles/member").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
