use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::{request::RequestStatus, varchar_enum};
use crate::error::AppError;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Unpaid,
}

varchar_enum!(LeaveType);

impl LeaveType {
    /// Column in `users` holding the balance drawn by this leave type.
    /// Unpaid leave draws from nothing.
    pub fn balance_column(&self) -> Option<&'static str> {
        match self {
            LeaveType::Annual => Some("annual_leave_balance"),
            LeaveType::Sick => Some("sick_leave_balance"),
            LeaveType::Maternity => Some("maternity_leave_balance"),
            LeaveType::Paternity => Some("paternity_leave_balance"),
            LeaveType::Unpaid => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaveType::Annual => "Annual",
            LeaveType::Sick => "Sick",
            LeaveType::Maternity => "Maternity",
            LeaveType::Paternity => "Paternity",
            LeaveType::Unpaid => "Unpaid",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
    pub status: RequestStatus,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn duration_days(&self) -> u32 {
        leave_duration(self.start_date, self.end_date).unwrap_or(0)
    }
}

/// Leave request joined with its owner's name.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: LeaveRequest,
    #[schema(example = "Jane Doe")]
    pub user_name: String,
}

/// Inclusive day count between two dates.
pub fn leave_duration(start: NaiveDate, end: NaiveDate) -> Result<u32, AppError> {
    if start > end {
        return Err(AppError::validation("Start date cannot be after end date"));
    }

    let days = (end - start).num_days() + 1;
    u32::try_from(days).map_err(|_| AppError::validation("Leave period is too long"))
}

/// Balance left after drawing `duration` days, or the rejection.
pub fn deduct_balance(balance: u32, duration: u32) -> Result<u32, AppError> {
    balance
        .checked_sub(duration)
        .ok_or_else(|| AppError::validation("Insufficient leave balance"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn duration_counts_both_ends() {
        assert_eq!(leave_duration(date(2026, 1, 1), date(2026, 1, 5)).unwrap(), 5);
        assert_eq!(leave_duration(date(2026, 3, 9), date(2026, 3, 9)).unwrap(), 1);
        assert_eq!(leave_duration(date(2026, 2, 27), date(2026, 3, 2)).unwrap(), 4);
    }

    #[test]
    fn duration_rejects_reversed_periods() {
        let err = leave_duration(date(2026, 1, 5), date(2026, 1, 1)).unwrap_err();
        assert_eq!(err.to_string(), "Start date cannot be after end date");
    }

    #[test]
    fn five_days_against_three_is_insufficient() {
        let duration = leave_duration(date(2026, 1, 1), date(2026, 1, 5)).unwrap();
        let err = deduct_balance(3, duration).unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Insufficient leave balance");
    }

    #[test]
    fn exact_balance_can_be_spent() {
        assert_eq!(deduct_balance(5, 5).unwrap(), 0);
        assert_eq!(deduct_balance(21, 5).unwrap(), 16);
    }

    #[test]
    fn unpaid_leave_has_no_balance() {
        assert_eq!(LeaveType::Unpaid.balance_column(), None);
        assert_eq!(LeaveType::Sick.balance_column(), Some("sick_leave_balance"));
        assert_eq!(
            LeaveType::Paternity.balance_column(),
            Some("paternity_leave_balance")
        );
    }
}
