use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{
        notification::RelatedModel,
        overtime_request::{OvertimeRequest, OvertimeWithUser},
        request::RequestStatus,
    },
    utils::notifier::{self, Related},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateOvertime {
    #[schema(example = "2026-01-10", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    #[schema(example = 2.5)]
    pub hours: Option<f64>,
    #[schema(example = "Quarter-end close")]
    pub reason: Option<String>,
}

pub(crate) async fn fetch_overtime_with_user(
    pool: &MySqlPool,
    overtime_id: u64,
) -> Result<Option<OvertimeWithUser>, sqlx::Error> {
    sqlx::query_as::<_, OvertimeWithUser>(
        r#"
        SELECT o.id, o.user_id, o.date, o.hours, o.reason, o.status,
               o.created_at, o.updated_at, u.name AS user_name
        FROM overtime_requests o
        JOIN users u ON u.id = o.user_id
        WHERE o.id = ?
        "#,
    )
    .bind(overtime_id)
    .fetch_optional(pool)
    .await
}

#[utoipa::path(
    post,
    path = "/api/overtime",
    request_body = CreateOvertime,
    responses(
        (status = 201, description = "Overtime request submitted", body = OvertimeRequest),
        (status = 400, description = "Missing fields or non-positive hours"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn create_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateOvertime>,
) -> Result<HttpResponse, AppError> {
    let req = payload.into_inner();

    let (Some(date), Some(hours), Some(reason)) = (
        req.date,
        req.hours,
        req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()),
    ) else {
        return Err(AppError::validation("Missing required fields"));
    };

    if !hours.is_finite() || hours <= 0.0 {
        return Err(AppError::validation("Hours must be greater than zero"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO overtime_requests (user_id, date, hours, reason, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(date)
    .bind(hours)
    .bind(reason)
    .bind(RequestStatus::Pending)
    .execute(pool.get_ref())
    .await?;

    let overtime_id = result.last_insert_id();
    tracing::info!(user_id = auth.user_id, overtime_id, hours, "Overtime request submitted");

    notifier::notify_privileged(
        pool.get_ref(),
        &notifier::overtime_submitted_message(&auth.name),
        Some(Related {
            model: RelatedModel::OvertimeRequest,
            id: overtime_id,
        }),
    )
    .await;

    let created = sqlx::query_as::<_, OvertimeRequest>(
        r#"
        SELECT id, user_id, date, hours, reason, status, created_at, updated_at
        FROM overtime_requests
        WHERE id = ?
        "#,
    )
    .bind(overtime_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/overtime/history",
    responses(
        (status = 200, description = "Own overtime requests, newest first", body = [OvertimeRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn overtime_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let requests = sqlx::query_as::<_, OvertimeRequest>(
        r#"
        SELECT id, user_id, date, hours, reason, status, created_at, updated_at
        FROM overtime_requests
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/overtime/{overtime_id}",
    params(
        ("overtime_id" = u64, Path, description = "ID of the overtime request")
    ),
    responses(
        (status = 200, description = "Overtime request found", body = OvertimeWithUser),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Overtime request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn get_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let overtime_id = path.into_inner();

    let overtime = fetch_overtime_with_user(pool.get_ref(), overtime_id)
        .await?
        .ok_or_else(|| AppError::not_found("Overtime request not found"))?;

    auth.require_owner_or_privileged(overtime.request.user_id)?;

    Ok(HttpResponse::Ok().json(overtime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::auth_middleware;
    use crate::config::Config;
    use crate::model::role::Role;
    use crate::testing::{bearer_for, lazy_pool};
    use actix_web::{App, http::StatusCode, middleware::from_fn, test};
    use serde_json::json;

    async fn submit(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .route("/overtime", web::post().to(create_overtime)),
                ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/overtime")
            .insert_header(("Authorization", bearer_for(8, Role::Employee)))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn zero_hours_are_rejected() {
        let (status, body) = submit(json!({
            "date": "2026-01-10",
            "hours": 0,
            "reason": "Release"
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Hours must be greater than zero");
    }

    #[actix_web::test]
    async fn blank_reason_counts_as_missing() {
        let (status, body) = submit(json!({
            "date": "2026-01-10",
            "hours": 3.0,
            "reason": "   "
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields");
    }
}
