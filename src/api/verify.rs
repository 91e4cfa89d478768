//! Public lookups printed on approval documents. No session required.

use crate::{
    api::{leave_request::fetch_leave_with_user, overtime_request::fetch_overtime_with_user},
    error::AppError,
    model::{
        leave_request::{LeaveType, LeaveWithUser},
        overtime_request::OvertimeWithUser,
        request::RequestStatus,
    },
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveVerification {
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: RequestStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeVerification {
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 2.5)]
    pub hours: f64,
    pub status: RequestStatus,
}

/// Only approved leave is verifiable; anything else reads as missing.
pub fn leave_verification(leave: LeaveWithUser) -> Option<LeaveVerification> {
    (leave.request.status == RequestStatus::Approved).then(|| LeaveVerification {
        employee_name: leave.user_name,
        leave_type: leave.request.leave_type,
        start_date: leave.request.start_date,
        end_date: leave.request.end_date,
        status: leave.request.status,
    })
}

pub fn overtime_verification(overtime: OvertimeWithUser) -> Option<OvertimeVerification> {
    (overtime.request.status == RequestStatus::Approved).then(|| OvertimeVerification {
        employee_name: overtime.user_name,
        date: overtime.request.date,
        hours: overtime.request.hours,
        status: overtime.request.status,
    })
}

#[utoipa::path(
    get,
    path = "/verify/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "Reference printed on the approval document")
    ),
    responses(
        (status = 200, description = "Approved leave", body = LeaveVerification),
        (status = 404, description = "Approved leave request not found")
    ),
    tag = "Verify"
)]
pub async fn verify_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();

    let verification = fetch_leave_with_user(pool.get_ref(), leave_id)
        .await?
        .and_then(leave_verification)
        .ok_or_else(|| AppError::not_found("Approved leave request not found"))?;

    tracing::debug!(leave_id, "Leave verified");

    Ok(HttpResponse::Ok().json(verification))
}

#[utoipa::path(
    get,
    path = "/verify/overtime/{overtime_id}",
    params(
        ("overtime_id" = u64, Path, description = "Overtime request reference")
    ),
    responses(
        (status = 200, description = "Approved overtime", body = OvertimeVerification),
        (status = 404, description = "Approved overtime request not found")
    ),
    tag = "Verify"
)]
pub async fn verify_overtime(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let overtime_id = path.into_inner();

    let verification = fetch_overtime_with_user(pool.get_ref(), overtime_id)
        .await?
        .and_then(overtime_verification)
        .ok_or_else(|| AppError::not_found("Approved overtime request not found"))?;

    Ok(HttpResponse::Ok().json(verification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{leave_request::LeaveRequest, overtime_request::OvertimeRequest};
    use chrono::Utc;

    fn leave(status: RequestStatus) -> LeaveWithUser {
        let at = Utc::now();
        LeaveWithUser {
            request: LeaveRequest {
                id: 12,
                user_id: 7,
                leave_type: LeaveType::Annual,
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                reason: "Private reason".to_string(),
                status,
                created_at: at,
                updated_at: at,
            },
            user_name: "Jane Doe".to_string(),
        }
    }

    #[test]
    fn approved_leave_verifies_with_public_fields_only() {
        let verification = leave_verification(leave(RequestStatus::Approved)).unwrap();
        let value = serde_json::to_value(&verification).unwrap();

        assert_eq!(value["employeeName"], "Jane Doe");
        assert_eq!(value["leaveType"], "ANNUAL");
        assert_eq!(value["startDate"], "2026-01-01");
        assert_eq!(value["endDate"], "2026-01-05");
        assert_eq!(value["status"], "APPROVED");
        assert_eq!(value.as_object().unwrap().len(), 5);
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn pending_and_denied_leave_do_not_verify() {
        assert!(leave_verification(leave(RequestStatus::Pending)).is_none());
        assert!(leave_verification(leave(RequestStatus::Denied)).is_none());
    }

    #[test]
    fn overtime_verifies_only_when_approved() {
        let at = Utc::now();
        let overtime = |status| OvertimeWithUser {
            request: OvertimeRequest {
                id: 4,
                user_id: 7,
                date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
                hours: 2.5,
                reason: "Close".to_string(),
                status,
                created_at: at,
                updated_at: at,
            },
            user_name: "Jane Doe".to_string(),
        };

        let verified = overtime_verification(overtime(RequestStatus::Approved)).unwrap();
        assert_eq!(verified.hours, 2.5);
        assert!(overtime_verification(overtime(RequestStatus::Denied)).is_none());
    }
}
