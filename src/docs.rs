use crate::api::{
    leave_request::CreateLeave,
    overtime_request::CreateOvertime,
    profile::UpdateBio,
    requests::UpdateStatusReq,
    users::UpdateUser,
    verify::{LeaveVerification, OvertimeVerification},
};
use crate::auth::handlers::{LoginResponse, SessionUser};
use crate::model::{
    gender::Gender,
    leave_request::{LeaveRequest, LeaveType, LeaveWithUser},
    notification::{Notification, RelatedModel},
    overtime_request::{OvertimeRequest, OvertimeWithUser},
    request::{RequestKind, RequestStatus},
    role::Role,
    user::{LeaveBalances, Profile, UserSummary},
};
use crate::models::{ForgotPasswordReq, LoginReqDto, RegisterReq, ResetPasswordReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Portal API",
        version = "1.0.0",
        description = r#"
## HR Portal

Leave and overtime requests with HR/Admin approval.

### Key Features
- **Leave Management**
  - Submit leave against per-type balances, view history, download approval PDFs
- **Overtime Management**
  - Submit overtime and view history
- **Approvals**
  - Pending queue and approve/deny decisions for HR and Admin
- **Accounts**
  - Registration with admin activation, password reset, user management
- **Notifications**
  - In-app notifications for submissions and decisions

### Security
Endpoints under `/api` require a **JWT Bearer** access token.
`/auth/*` and `/verify/*` are public.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::forgot_password,
        crate::auth::handlers::reset_password,

        crate::api::dashboard::dashboard,

        crate::api::profile::get_profile,
        crate::api::profile::update_bio,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_history,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::download_pdf,

        crate::api::overtime_request::create_overtime,
        crate::api::overtime_request::overtime_history,
        crate::api::overtime_request::get_overtime,

        crate::api::requests::pending_requests,
        crate::api::requests::my_history,
        crate::api::requests::update_status,

        crate::api::users::list_users,
        crate::api::users::update_user,

        crate::api::notifications::list_notifications,
        crate::api::notifications::notification_details,
        crate::api::notifications::mark_read,

        crate::api::verify::verify_leave,
        crate::api::verify::verify_overtime
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            SessionUser,
            ForgotPasswordReq,
            ResetPasswordReq,
            Role,
            Gender,
            LeaveType,
            RequestStatus,
            RequestKind,
            RelatedModel,
            LeaveBalances,
            Profile,
            UserSummary,
            UpdateUser,
            UpdateBio,
            CreateLeave,
            LeaveRequest,
            LeaveWithUser,
            CreateOvertime,
            OvertimeRequest,
            OvertimeWithUser,
            UpdateStatusReq,
            Notification,
            LeaveVerification,
            OvertimeVerification
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, sessions and password reset"),
        (name = "Dashboard", description = "Landing page data"),
        (name = "Profile", description = "Own profile and bio"),
        (name = "Leave", description = "Leave requests"),
        (name = "Overtime", description = "Overtime requests"),
        (name = "Requests", description = "Approval queue and decisions"),
        (name = "Users", description = "Account management"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Verify", description = "Public document verification"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_public_and_protected_paths() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/requests/update"));
        assert!(doc.paths.paths.contains_key("/verify/{leave_id}"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
