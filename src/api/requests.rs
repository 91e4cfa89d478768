use crate::{
    api::{
        leave_request::{fetch_leave_for_document, fetch_leave_with_user},
        overtime_request::fetch_overtime_with_user,
    },
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    mail::{EmailAttachment, EmailMessage, EmailSender, templates::LeaveApprovedMessage},
    model::{
        leave_request::LeaveWithUser,
        overtime_request::OvertimeWithUser,
        request::{RequestKind, RequestStatus},
    },
    utils::{
        leave_pdf::render_leave_pdf,
        notifier::{self, Related},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Leave or overtime request, tagged with `type` on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum RequestItem {
    Leave(LeaveWithUser),
    Overtime(OvertimeWithUser),
}

impl RequestItem {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            RequestItem::Leave(l) => l.request.created_at,
            RequestItem::Overtime(o) => o.request.created_at,
        }
    }
}

/// Sorts by creation time, newest first. Ties keep their input order.
pub(crate) fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

fn merge(leaves: Vec<LeaveWithUser>, overtime: Vec<OvertimeWithUser>) -> Vec<RequestItem> {
    let items = leaves
        .into_iter()
        .map(RequestItem::Leave)
        .chain(overtime.into_iter().map(RequestItem::Overtime))
        .collect();

    newest_first(items, RequestItem::created_at)
}

#[utoipa::path(
    get,
    path = "/api/requests/pending",
    responses(
        (status = 200, description = "Pending leave and overtime, newest first, each tagged with `type`", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn pending_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let leaves = sqlx::query_as::<_, LeaveWithUser>(
        r#"
        SELECT lr.id, lr.user_id, lr.leave_type, lr.start_date, lr.end_date, lr.reason,
               lr.status, lr.created_at, lr.updated_at, u.name AS user_name
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.status = ?
        "#,
    )
    .bind(RequestStatus::Pending)
    .fetch_all(pool.get_ref())
    .await?;

    let overtime = sqlx::query_as::<_, OvertimeWithUser>(
        r#"
        SELECT o.id, o.user_id, o.date, o.hours, o.reason, o.status,
               o.created_at, o.updated_at, u.name AS user_name
        FROM overtime_requests o
        JOIN users u ON u.id = o.user_id
        WHERE o.status = ?
        "#,
    )
    .bind(RequestStatus::Pending)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(merge(leaves, overtime)))
}

#[utoipa::path(
    get,
    path = "/api/requests/my-history",
    responses(
        (status = 200, description = "Caller's leave and overtime, newest first, each tagged with `type`", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn my_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let leaves = sqlx::query_as::<_, LeaveWithUser>(
        r#"
        SELECT lr.id, lr.user_id, lr.leave_type, lr.start_date, lr.end_date, lr.reason,
               lr.status, lr.created_at, lr.updated_at, u.name AS user_name
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.user_id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    let overtime = sqlx::query_as::<_, OvertimeWithUser>(
        r#"
        SELECT o.id, o.user_id, o.date, o.hours, o.reason, o.status,
               o.created_at, o.updated_at, u.name AS user_name
        FROM overtime_requests o
        JOIN users u ON u.id = o.user_id
        WHERE o.user_id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(merge(leaves, overtime)))
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    #[schema(example = 12)]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: Option<RequestKind>,
    pub status: Option<RequestStatus>,
}

/// Mails the approval document to the employee. Failures are logged only.
async fn send_approval_email(pool: &MySqlPool, config: &Config, mailer: &EmailSender, leave_id: u64) {
    let leave = match fetch_leave_for_document(pool, leave_id).await {
        Ok(Some(leave)) => leave,
        Ok(None) => return,
        Err(e) => {
            tracing::error!(error = %e, leave_id, "Failed to load leave for approval email");
            return;
        }
    };

    let document = leave.document(config);
    let pdf = match render_leave_pdf(&document) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, leave_id, "Failed to render approval document");
            return;
        }
    };

    let message = EmailMessage {
        to: leave.user_email.clone(),
        subject: "Leave Request Approved".to_string(),
        html: LeaveApprovedMessage::generate(&leave.user_name, &config.company_name),
        attachments: vec![EmailAttachment {
            filename: document.attachment_filename(),
            content_type: "application/pdf",
            content: pdf,
        }],
    };

    match mailer.send(message).await {
        Ok(()) => tracing::info!(leave_id, "Approval document sent"),
        Err(e) => tracing::error!(error = %e, leave_id, "Failed to send approval email"),
    }
}

/// Records an HR/Admin decision. A decided request can be decided again.
#[utoipa::path(
    patch,
    path = "/api/requests/update",
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Updated request, tagged with `type`", body = Object),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    mailer: web::Data<EmailSender>,
    payload: web::Json<UpdateStatusReq>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let (Some(id), Some(kind), Some(status)) = (payload.id, payload.kind, payload.status) else {
        return Err(AppError::validation("Missing required fields"));
    };

    let item = match kind {
        RequestKind::Leave => {
            let existing = fetch_leave_with_user(pool.get_ref(), id)
                .await?
                .ok_or_else(|| AppError::not_found("Leave request not found"))?;

            sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
                .bind(status)
                .bind(id)
                .execute(pool.get_ref())
                .await?;

            if status == RequestStatus::Approved {
                send_approval_email(pool.get_ref(), &config, &mailer, id).await;
            }

            notifier::notify_user(
                pool.get_ref(),
                existing.request.user_id,
                &notifier::leave_decision_message(existing.request.start_date, status),
                Some(Related {
                    model: kind.into(),
                    id,
                }),
            )
            .await;

            let updated = fetch_leave_with_user(pool.get_ref(), id)
                .await?
                .ok_or_else(|| AppError::not_found("Leave request not found"))?;
            RequestItem::Leave(updated)
        }
        RequestKind::Overtime => {
            let existing = fetch_overtime_with_user(pool.get_ref(), id)
                .await?
                .ok_or_else(|| AppError::not_found("Overtime request not found"))?;

            sqlx::query("UPDATE overtime_requests SET status = ? WHERE id = ?")
                .bind(status)
                .bind(id)
                .execute(pool.get_ref())
                .await?;

            notifier::notify_user(
                pool.get_ref(),
                existing.request.user_id,
                &notifier::overtime_decision_message(existing.request.date, status),
                Some(Related {
                    model: kind.into(),
                    id,
                }),
            )
            .await;

            let updated = fetch_overtime_with_user(pool.get_ref(), id)
                .await?
                .ok_or_else(|| AppError::not_found("Overtime request not found"))?;
            RequestItem::Overtime(updated)
        }
    };

    tracing::info!(
        decided_by = auth.user_id,
        id,
        kind = %kind,
        status = %status,
        "Request status updated"
    );

    Ok(HttpResponse::Ok().json(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::auth_middleware;
    use crate::mail::log_sender::LogSender;
    use crate::model::{
        leave_request::{LeaveRequest, LeaveType},
        overtime_request::OvertimeRequest,
        role::Role,
    };
    use crate::testing::{bearer_for, lazy_pool};
    use actix_web::{App, http::StatusCode, middleware::from_fn};
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    fn leave(id: u64, created_at: DateTime<Utc>) -> LeaveWithUser {
        LeaveWithUser {
            request: LeaveRequest {
                id,
                user_id: 1,
                leave_type: LeaveType::Sick,
                start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
                reason: "Flu".to_string(),
                status: RequestStatus::Pending,
                created_at,
                updated_at: created_at,
            },
            user_name: "Jane Doe".to_string(),
        }
    }

    fn overtime(id: u64, created_at: DateTime<Utc>) -> OvertimeWithUser {
        OvertimeWithUser {
            request: OvertimeRequest {
                id,
                user_id: 1,
                date: NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
                hours: 2.0,
                reason: "Release".to_string(),
                status: RequestStatus::Pending,
                created_at,
                updated_at: created_at,
            },
            user_name: "Jane Doe".to_string(),
        }
    }

    #[test]
    fn merged_requests_are_newest_first() {
        let now = Utc::now();
        let merged = merge(
            vec![leave(1, now - Duration::hours(3)), leave(2, now)],
            vec![overtime(3, now - Duration::hours(1))],
        );

        let order: Vec<_> = merged
            .iter()
            .map(|item| match item {
                RequestItem::Leave(l) => ("Leave", l.request.id),
                RequestItem::Overtime(o) => ("Overtime", o.request.id),
            })
            .collect();

        assert_eq!(order, vec![("Leave", 2), ("Overtime", 3), ("Leave", 1)]);
    }

    #[test]
    fn items_serialize_flat_with_a_type_tag() {
        let value = serde_json::to_value(RequestItem::Overtime(overtime(3, Utc::now()))).unwrap();

        assert_eq!(value["type"], "Overtime");
        assert_eq!(value["id"], 3);
        assert_eq!(value["userName"], "Jane Doe");
        assert_eq!(value["status"], "PENDING");
    }

    macro_rules! app {
        () => {{
            let mailer: EmailSender = Box::new(LogSender::new());
            actix_web::test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(Config::for_tests()))
                    .app_data(web::Data::new(mailer))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/requests/pending", web::get().to(pending_requests))
                            .route("/requests/update", web::patch().to(update_status)),
                    ),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn employees_cannot_decide_requests() {
        let app = app!();
        let req = actix_web::test::TestRequest::patch()
            .uri("/api/requests/update")
            .insert_header(("Authorization", bearer_for(4, Role::Employee)))
            .set_json(json!({ "id": 1, "type": "Leave", "status": "APPROVED" }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn employees_cannot_see_the_pending_queue() {
        let app = app!();
        let req = actix_web::test::TestRequest::get()
            .uri("/api/requests/pending")
            .insert_header(("Authorization", bearer_for(4, Role::Employee)))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn decisions_need_id_type_and_status() {
        let app = app!();
        let req = actix_web::test::TestRequest::patch()
            .uri("/api/requests/update")
            .insert_header(("Authorization", bearer_for(2, Role::Hr)))
            .set_json(json!({ "id": 1, "type": "Leave" }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(body["message"], "Missing required fields");
    }
}
