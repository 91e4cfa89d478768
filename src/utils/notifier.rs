use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use crate::model::{notification::RelatedModel, request::RequestStatus, role::Role};

/// Record a notification points at.
#[derive(Debug, Clone, Copy)]
pub struct Related {
    pub model: RelatedModel,
    pub id: u64,
}

/// Writes one row per admin/HR account. Failures are logged, never returned.
pub async fn notify_privileged(pool: &MySqlPool, message: &str, related: Option<Related>) {
    let recipients = match sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE role IN (?, ?)")
        .bind(Role::Admin)
        .bind(Role::Hr)
        .fetch_all(pool)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load admin/HR recipients");
            return;
        }
    };

    if recipients.is_empty() {
        tracing::info!("No admin or HR users found to notify");
        return;
    }

    match insert_rows(pool, &recipients, message, related).await {
        Ok(count) => tracing::debug!(count, "Notified admin/HR users"),
        Err(e) => tracing::error!(error = %e, "Failed to create admin/HR notifications"),
    }
}

/// Writes a single row for one account. Failures are logged, never returned.
pub async fn notify_user(pool: &MySqlPool, user_id: u64, message: &str, related: Option<Related>) {
    if let Err(e) = insert_rows(pool, &[user_id], message, related).await {
        tracing::error!(error = %e, user_id, "Failed to create notification");
    }
}

async fn insert_rows(
    pool: &MySqlPool,
    recipients: &[u64],
    message: &str,
    related: Option<Related>,
) -> Result<u64, sqlx::Error> {
    let mut builder: QueryBuilder<MySql> =
        QueryBuilder::new("INSERT INTO notifications (user_id, message, related_model, related_id) ");

    builder.push_values(recipients, |mut row, user_id| {
        row.push_bind(*user_id)
            .push_bind(message.to_string())
            .push_bind(related.map(|r| r.model))
            .push_bind(related.map(|r| r.id));
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub fn registration_message(name: &str, email: &str) -> String {
    format!("New user registered: {name} ({email}). Account requires activation.")
}

pub fn leave_submitted_message(name: &str) -> String {
    format!("New leave request submitted by {name}.")
}

pub fn overtime_submitted_message(name: &str) -> String {
    format!("New overtime request from {name}.")
}

pub fn leave_decision_message(start_date: NaiveDate, status: RequestStatus) -> String {
    format!(
        "Your leave request from {} has been {}.",
        start_date.format("%Y-%m-%d"),
        status.label()
    )
}

pub fn overtime_decision_message(date: NaiveDate, status: RequestStatus) -> String {
    format!(
        "Your overtime request for {} has been {}.",
        date.format("%Y-%m-%d"),
        status.label()
    )
}
