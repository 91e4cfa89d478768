use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,
    pub reset_token_ttl: i64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_password_reset_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    /// Base URL of the web front end, used in emailed and printed links.
    pub app_base_url: String,
    pub company_name: String,

    pub log_dir: String,
    pub log_level: String,

    /// `None` when any SMTP variable is missing; mail is then only logged.
    pub smtp: Option<SmtpConfig>,

    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<String>,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let smtp = match (
            optional("SMTP_HOST"),
            optional("SMTP_USER"),
            optional("SMTP_PASS"),
            optional("SMTP_FROM_EMAIL"),
        ) {
            (Some(host), Some(username), Some(password), Some(from_email)) => Some(SmtpConfig {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username,
                password,
                from_email,
            }),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 10)?,
            run_migrations: parsed("RUN_MIGRATIONS", true)?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", 604_800)?, // 7 days
            reset_token_ttl: parsed("RESET_TOKEN_TTL", 3600)?, // 1 hour

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", 30)?,
            rate_password_reset_per_min: parsed("RATE_PASSWORD_RESET_PER_MIN", 10)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            app_base_url: optional("APP_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            company_name: optional("COMPANY_NAME").unwrap_or_else(|| "HR Portal".to_string()),

            log_dir: optional("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),

            smtp,

            seed_admin_email: optional("SEED_ADMIN_EMAIL"),
            seed_admin_password: optional("SEED_ADMIN_PASSWORD"),
        })
    }

    /// Link printed on approval documents and shown to third parties.
    pub fn leave_verification_url(&self, leave_id: u64) -> String {
        format!("{}/verify/{}", self.app_base_url, leave_id)
    }

    pub fn password_reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.app_base_url, token)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://hr:hr@localhost:3306/hr_portal_test".to_string(),
            db_max_connections: 1,
            run_migrations: false,
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            reset_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_password_reset_per_min: 10,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            app_base_url: "https://hr.example.com".to_string(),
            company_name: "Example Ltd".to_string(),
            log_dir: "logs".to_string(),
            log_level: "debug".to_string(),
            smtp: None,
            seed_admin_email: None,
            seed_admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_front_end_links() {
        let config = Config::for_tests();

        assert_eq!(
            config.leave_verification_url(42),
            "https://hr.example.com/verify/42"
        );
        assert_eq!(
            config.password_reset_url("abc"),
            "https://hr.example.com/reset-password?token=abc"
        );
    }
}
