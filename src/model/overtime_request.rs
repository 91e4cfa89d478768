use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::request::RequestStatus;

#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRequest {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 2.5)]
    pub hours: f64,
    #[schema(example = "Quarter-end close")]
    pub reason: String,
    pub status: RequestStatus,
    #[schema(example = "2026-01-10T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-10T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: OvertimeRequest,
    pub user_name: String,
}
