use crate::{
    api::requests::newest_first,
    auth::auth::AuthUser,
    error::AppError,
    model::{
        gender::Gender, leave_request::LeaveRequest, overtime_request::OvertimeRequest,
        request::RequestStatus, user::LeaveBalances,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::MySqlPool;

const RECENT_LEAVE: u32 = 3;
const RECENT_OVERTIME: u32 = 2;
const RECENT_ACTIVITY: usize = 5;

#[derive(Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProfile {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub balances: LeaveBalances,
    pub gender: Gender,
}

/// Recent activity entry, tagged with `requestType`.
#[derive(Serialize)]
#[serde(tag = "requestType")]
pub enum Activity {
    Leave(LeaveRequest),
    Overtime(OvertimeRequest),
}

impl Activity {
    fn created_at(&self) -> DateTime<Utc> {
        match self {
            Activity::Leave(l) => l.created_at,
            Activity::Overtime(o) => o.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub pending_requests: i64,
    pub active_employees: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user_profile: Option<DashboardProfile>,
    pub recent_activity: Vec<Activity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_stats: Option<AdminStats>,
}

fn recent_activity(leaves: Vec<LeaveRequest>, overtime: Vec<OvertimeRequest>) -> Vec<Activity> {
    let items = leaves
        .into_iter()
        .map(Activity::Leave)
        .chain(overtime.into_iter().map(Activity::Overtime))
        .collect();

    let mut items = newest_first(items, Activity::created_at);
    items.truncate(RECENT_ACTIVITY);
    items
}

async fn admin_stats(pool: &MySqlPool) -> Result<AdminStats, sqlx::Error> {
    let pending_requests = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM leave_requests WHERE status = ?)
          + (SELECT COUNT(*) FROM overtime_requests WHERE status = ?)
        "#,
    )
    .bind(RequestStatus::Pending)
    .bind(RequestStatus::Pending)
    .fetch_one(pool)
    .await?;

    let active_employees =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

    Ok(AdminStats {
        pending_requests,
        active_employees,
    })
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Balances, recent activity and, for HR/Admin, queue stats", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let user_profile = sqlx::query_as::<_, DashboardProfile>(
        r#"
        SELECT annual_leave_balance, sick_leave_balance,
               maternity_leave_balance, paternity_leave_balance, gender
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let leaves = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, leave_type, start_date, end_date, reason, status,
               created_at, updated_at
        FROM leave_requests
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(auth.user_id)
    .bind(RECENT_LEAVE)
    .fetch_all(pool.get_ref())
    .await?;

    let overtime = sqlx::query_as::<_, OvertimeRequest>(
        r#"
        SELECT id, user_id, date, hours, reason, status, created_at, updated_at
        FROM overtime_requests
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(auth.user_id)
    .bind(RECENT_OVERTIME)
    .fetch_all(pool.get_ref())
    .await?;

    let admin_stats = if auth.role.is_privileged() {
        Some(admin_stats(pool.get_ref()).await?)
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(Dashboard {
        user_profile,
        recent_activity: recent_activity(leaves, overtime),
        admin_stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;
    use chrono::{Duration, NaiveDate};

    fn leave(id: u64, created_at: DateTime<Utc>) -> LeaveRequest {
        LeaveRequest {
            id,
            user_id: 1,
            leave_type: LeaveType::Annual,
            start_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            reason: "Rest".to_string(),
            status: RequestStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }

    fn overtime(id: u64, created_at: DateTime<Utc>) -> OvertimeRequest {
        OvertimeRequest {
            id,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 4, 3).unwrap(),
            hours: 1.5,
            reason: "Deploy".to_string(),
            status: RequestStatus::Approved,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn activity_is_capped_and_newest_first() {
        let now = Utc::now();
        let activity = recent_activity(
            vec![
                leave(1, now - Duration::days(1)),
                leave(2, now - Duration::days(5)),
                leave(3, now - Duration::days(6)),
            ],
            vec![
                overtime(10, now),
                overtime(11, now - Duration::days(2)),
                overtime(12, now - Duration::days(9)),
            ],
        );

        let ids: Vec<u64> = activity
            .iter()
            .map(|a| match a {
                Activity::Leave(l) => l.id,
                Activity::Overtime(o) => o.id,
            })
            .collect();

        assert_eq!(ids, vec![10, 1, 11, 2, 3]);
    }

    #[test]
    fn employees_get_no_admin_stats_field() {
        let dashboard = Dashboard {
            user_profile: None,
            recent_activity: vec![Activity::Overtime(overtime(1, Utc::now()))],
            admin_stats: None,
        };
        let value = serde_json::to_value(&dashboard).unwrap();

        assert!(value.get("adminStats").is_none());
        assert_eq!(value["recentActivity"][0]["requestType"], "Overtime");
        assert_eq!(value["recentActivity"][0]["hours"], 1.5);
    }
}
