use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{gender::Gender, role::Role};

pub const DEFAULT_ANNUAL_LEAVE: u32 = 21;
pub const DEFAULT_SICK_LEAVE: u32 = 10;
pub const DEFAULT_MATERNITY_LEAVE: u32 = 90;
pub const DEFAULT_PATERNITY_LEAVE: u32 = 14;

/// Full account row, including credentials. Never serialized to clients.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub bio: Option<String>,
    pub is_active: bool,
    pub annual_leave_balance: u32,
    pub sick_leave_balance: u32,
    pub maternity_leave_balance: u32,
    pub paternity_leave_balance: u32,
}

/// Opening leave balances for a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalances {
    pub annual_leave_balance: u32,
    pub sick_leave_balance: u32,
    pub maternity_leave_balance: u32,
    pub paternity_leave_balance: u32,
}

impl LeaveBalances {
    /// Maternity leave is zeroed for men, paternity leave for women.
    pub fn for_gender(gender: Gender) -> Self {
        let (maternity, paternity) = match gender {
            Gender::Male => (0, DEFAULT_PATERNITY_LEAVE),
            Gender::Female => (DEFAULT_MATERNITY_LEAVE, 0),
        };

        Self {
            annual_leave_balance: DEFAULT_ANNUAL_LEAVE,
            sick_leave_balance: DEFAULT_SICK_LEAVE,
            maternity_leave_balance: maternity,
            paternity_leave_balance: paternity,
        }
    }
}

/// Row shown in the user management table.
#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub gender: Gender,
    #[schema(example = "1990-01-01", format = "date", value_type = String)]
    pub date_of_birth: NaiveDate,
    pub bio: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub balances: LeaveBalances,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn male_accounts_start_without_maternity_leave() {
        let balances = LeaveBalances::for_gender(Gender::Male);

        assert_eq!(balances.maternity_leave_balance, 0);
        assert_eq!(balances.paternity_leave_balance, DEFAULT_PATERNITY_LEAVE);
        assert_eq!(balances.annual_leave_balance, DEFAULT_ANNUAL_LEAVE);
    }

    #[test]
    fn female_accounts_start_without_paternity_leave() {
        let balances = LeaveBalances::for_gender(Gender::Female);

        assert_eq!(balances.paternity_leave_balance, 0);
        assert_eq!(balances.maternity_leave_balance, DEFAULT_MATERNITY_LEAVE);
        assert_eq!(balances.sick_leave_balance, DEFAULT_SICK_LEAVE);
    }
}
