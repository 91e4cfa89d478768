use crate::{
    api::{
        leave_request::fetch_leave_with_user, overtime_request::fetch_overtime_with_user,
        requests::RequestItem,
    },
    auth::auth::AuthUser,
    error::AppError,
    model::notification::{Notification, RelatedModel},
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;

const RECENT_LIMIT: u32 = 10;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetails {
    pub notification: Notification,
    pub related_item: Option<RequestItem>,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's 10 most recent notifications", body = [Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, message, is_read, related_model, related_id, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(auth.user_id)
    .bind(RECENT_LIMIT)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(notifications))
}

async fn related_item(
    pool: &MySqlPool,
    notification: &Notification,
) -> Result<Option<RequestItem>, sqlx::Error> {
    let (Some(model), Some(id)) = (notification.related_model, notification.related_id) else {
        return Ok(None);
    };

    Ok(match model {
        RelatedModel::LeaveRequest => fetch_leave_with_user(pool, id).await?.map(RequestItem::Leave),
        RelatedModel::OvertimeRequest => fetch_overtime_with_user(pool, id)
            .await?
            .map(RequestItem::Overtime),
    })
}

/// Opens one of the caller's notifications and marks it read.
#[utoipa::path(
    get,
    path = "/api/notifications/details/{notification_id}",
    params(
        ("notification_id" = u64, Path, description = "Notification to open")
    ),
    responses(
        (status = 200, description = "Notification with the request it points at", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn notification_details(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let notification_id = path.into_inner();

    let mut notification = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, message, is_read, related_model, related_id, created_at
        FROM notifications
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(notification_id)
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::not_found("Notification not found"))?;

    if !notification.is_read {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
            .bind(notification_id)
            .execute(pool.get_ref())
            .await?;
        notification.is_read = true;
    }

    let related_item = related_item(pool.get_ref(), &notification).await?;

    Ok(HttpResponse::Ok().json(NotificationDetails {
        notification,
        related_item,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{notification_id}/mark-read",
    params(
        ("notification_id" = u64, Path, description = "Notification to mark read")
    ),
    responses(
        (status = 200, description = "Marked read", body = Object,
         example = json!({ "message": "Notification marked as read" })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let notification_id = path.into_inner();

    let owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM notifications WHERE id = ? AND user_id = ?)",
    )
    .bind(notification_id)
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !owned {
        return Err(AppError::not_found("Notification not found"));
    }

    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
        .bind(notification_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Notification marked as read" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(related_model: Option<RelatedModel>, related_id: Option<u64>) -> Notification {
        Notification {
            id: 1,
            user_id: 2,
            message: "New user registered".to_string(),
            is_read: false,
            related_model,
            related_id,
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn unlinked_notifications_have_no_related_item() {
        // returns before any query runs
        let pool = crate::testing::lazy_pool();

        assert!(related_item(&pool, &notification(None, None)).await.unwrap().is_none());
        assert!(
            related_item(&pool, &notification(Some(RelatedModel::LeaveRequest), None))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn details_serialize_in_camel_case() {
        let details = NotificationDetails {
            notification: notification(Some(RelatedModel::OvertimeRequest), Some(4)),
            related_item: None,
        };
        let value = serde_json::to_value(&details).unwrap();

        assert_eq!(value["notification"]["relatedModel"], "OvertimeRequest");
        assert_eq!(value["notification"]["isRead"], false);
        assert!(value["relatedItem"].is_null());
    }
}
