use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::{request::RequestKind, varchar_enum};

/// Table a notification links to.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
pub enum RelatedModel {
    LeaveRequest,
    OvertimeRequest,
}

varchar_enum!(RelatedModel);

impl From<RequestKind> for RelatedModel {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Leave => RelatedModel::LeaveRequest,
            RequestKind::Overtime => RelatedModel::OvertimeRequest,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "Your leave request from 2026-01-01 has been approved.")]
    pub message: String,
    pub is_read: bool,
    pub related_model: Option<RelatedModel>,
    pub related_id: Option<u64>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}
