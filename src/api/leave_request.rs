use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::{
        leave_request::{LeaveRequest, LeaveType, LeaveWithUser, deduct_balance, leave_duration},
        notification::RelatedModel,
        request::RequestStatus,
    },
    utils::{
        leave_pdf::{LeaveDocument, render_leave_pdf},
        notifier::{self, Related},
    },
};
use actix_web::{HttpResponse, http::header, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    pub leave_type: Option<LeaveType>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
}

/// Leave request with the owner's contact details, as printed on the PDF.
#[derive(sqlx::FromRow)]
pub(crate) struct LeaveForDocument {
    #[sqlx(flatten)]
    pub request: LeaveRequest,
    pub user_name: String,
    pub user_email: String,
}

impl LeaveForDocument {
    pub fn document(&self, config: &Config) -> LeaveDocument {
        LeaveDocument {
            leave_id: self.request.id,
            company_name: config.company_name.clone(),
            employee_name: self.user_name.clone(),
            employee_email: self.user_email.clone(),
            leave_type: self.request.leave_type,
            start_date: self.request.start_date,
            end_date: self.request.end_date,
            duration_days: self.request.duration_days(),
            reason: self.request.reason.clone(),
            status: self.request.status,
            verification_url: config.leave_verification_url(self.request.id),
        }
    }
}

pub(crate) async fn fetch_leave_for_document(
    pool: &MySqlPool,
    leave_id: u64,
) -> Result<Option<LeaveForDocument>, sqlx::Error> {
    sqlx::query_as::<_, LeaveForDocument>(
        r#"
        SELECT lr.id, lr.user_id, lr.leave_type, lr.start_date, lr.end_date, lr.reason,
               lr.status, lr.created_at, lr.updated_at,
               u.name AS user_name, u.email AS user_email
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn fetch_leave_with_user(
    pool: &MySqlPool,
    leave_id: u64,
) -> Result<Option<LeaveWithUser>, sqlx::Error> {
    sqlx::query_as::<_, LeaveWithUser>(
        r#"
        SELECT lr.id, lr.user_id, lr.leave_type, lr.start_date, lr.end_date, lr.reason,
               lr.status, lr.created_at, lr.updated_at, u.name AS user_name
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool)
    .await
}

/* =========================
Submit leave request
========================= */
/// Draws the balance and records the request atomically.
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Missing fields, reversed dates or insufficient balance", body = Object,
         example = json!({ "message": "Insufficient leave balance" })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    let req = payload.into_inner();

    let (Some(leave_type), Some(start_date), Some(end_date), Some(reason)) = (
        req.leave_type,
        req.start_date,
        req.end_date,
        req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()),
    ) else {
        return Err(AppError::validation("Missing required fields"));
    };

    let duration = leave_duration(start_date, end_date)?;

    let mut tx = pool.begin().await?;

    if let Some(column) = leave_type.balance_column() {
        // row lock holds concurrent submissions until commit
        let select_sql = format!("SELECT {column} FROM users WHERE id = ? FOR UPDATE");
        let balance = sqlx::query_scalar::<_, u32>(&select_sql)
            .bind(auth.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let remaining = deduct_balance(balance, duration).inspect_err(|_| {
            tracing::info!(
                user_id = auth.user_id,
                balance,
                duration,
                leave_type = %leave_type,
                "Leave rejected: insufficient balance"
            );
        })?;

        let update_sql = format!("UPDATE users SET {column} = ? WHERE id = ?");
        sqlx::query(&update_sql)
            .bind(remaining)
            .bind(auth.user_id)
            .execute(&mut *tx)
            .await?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, leave_type, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(leave_type)
    .bind(start_date)
    .bind(end_date)
    .bind(reason)
    .bind(RequestStatus::Pending)
    .execute(&mut *tx)
    .await?;

    let leave_id = result.last_insert_id();
    let created = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, leave_type, start_date, end_date, reason, status,
               created_at, updated_at
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = auth.user_id, leave_id, duration, "Leave request submitted");

    notifier::notify_privileged(
        pool.get_ref(),
        &notifier::leave_submitted_message(&auth.name),
        Some(Related {
            model: RelatedModel::LeaveRequest,
            id: leave_id,
        }),
    )
    .await;

    Ok(HttpResponse::Created().json(created))
}

/// Caller's own leave requests, newest first.
#[utoipa::path(
    get,
    path = "/api/leave/history",
    responses(
        (status = 200, description = "Own leave requests", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let leaves = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, leave_type, start_date, end_date, reason, status,
               created_at, updated_at
        FROM leave_requests
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveWithUser),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();

    let leave = fetch_leave_with_user(pool.get_ref(), leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    auth.require_owner_or_privileged(leave.request.user_id)?;

    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/download-pdf",
    params(
        ("leave_id" = u64, Path, description = "ID of an approved leave request")
    ),
    responses(
        (status = 200, description = "Approval document (application/pdf)"),
        (status = 400, description = "Leave request is not approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn download_pdf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();

    let leave = fetch_leave_for_document(pool.get_ref(), leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    auth.require_owner_or_privileged(leave.request.user_id)?;

    if leave.request.status != RequestStatus::Approved {
        return Err(AppError::validation(
            "Only approved leave requests have a document",
        ));
    }

    let document = leave.document(&config);
    let bytes = render_leave_pdf(&document)?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.filename()),
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::testing::{bearer_for, lazy_pool};
    use actix_web::{App, http::StatusCode, middleware::from_fn};
    use serde_json::json;

    use crate::auth::middleware::auth_middleware;

    macro_rules! app {
        () => {
            actix_web::test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(Config::for_tests()))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/leave", web::post().to(create_leave)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn submitting_leave_requires_a_session() {
        let app = app!();
        let req = actix_web::test::TestRequest::post()
            .uri("/api/leave")
            .set_json(json!({}))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn missing_fields_are_rejected_before_touching_balances() {
        let app = app!();
        let req = actix_web::test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(("Authorization", bearer_for(5, Role::Employee)))
            .set_json(json!({ "leaveType": "ANNUAL", "startDate": "2026-01-01" }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(body["message"], "Missing required fields");
    }

    #[actix_web::test]
    async fn reversed_dates_are_rejected() {
        let app = app!();
        let req = actix_web::test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(("Authorization", bearer_for(5, Role::Employee)))
            .set_json(json!({
                "leaveType": "SICK",
                "startDate": "2026-01-05",
                "endDate": "2026-01-01",
                "reason": "Flu"
            }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(body["message"], "Start date cannot be after end date");
    }

    #[test]
    fn document_carries_verification_link_and_duration() {
        let at = chrono::Utc::now();
        let leave = LeaveForDocument {
            request: LeaveRequest {
                id: 9,
                user_id: 5,
                leave_type: LeaveType::Annual,
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                reason: "Trip".to_string(),
                status: RequestStatus::Approved,
                created_at: at,
                updated_at: at,
            },
            user_name: "Jane Doe".to_string(),
            user_email: "jane@company.com".to_string(),
        };

        let document = leave.document(&Config::for_tests());

        assert_eq!(document.duration_days, 5);
        assert_eq!(document.verification_url, "https://hr.example.com/verify/9");
        assert_eq!(document.company_name, "Example Ltd");
    }
}
