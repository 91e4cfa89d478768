use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::{gender::Gender, role::Role, user::LeaveBalances};

pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    if config.run_migrations {
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    Ok(pool)
}

/// Creates the bootstrap admin account when configured and not yet present.
pub async fn seed_admin(pool: &MySqlPool, config: &Config) -> Result<()> {
    let (Some(email), Some(password)) = (&config.seed_admin_email, &config.seed_admin_password)
    else {
        return Ok(());
    };

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    if exists {
        tracing::debug!(email = %email, "Seed admin already present");
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("{e}"))?;
    let balances = LeaveBalances::for_gender(Gender::Male);

    sqlx::query(
        r#"
        INSERT INTO users
            (name, email, password, role, gender, date_of_birth, is_active,
             annual_leave_balance, sick_leave_balance,
             maternity_leave_balance, paternity_leave_balance)
        VALUES (?, ?, ?, ?, ?, ?, TRUE, ?, ?, ?, ?)
        "#,
    )
    .bind("Admin User")
    .bind(email)
    .bind(hashed)
    .bind(Role::Admin)
    .bind(Gender::Male)
    .bind(chrono::NaiveDate::from_ymd_opt(1990, 1, 1))
    .bind(balances.annual_leave_balance)
    .bind(balances.sick_leave_balance)
    .bind(balances.maternity_leave_balance)
    .bind(balances.paternity_leave_balance)
    .execute(pool)
    .await?;

    tracing::info!(email = %email, "Created seed admin account");
    Ok(())
}
