use crate::{
    auth::{
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
        reset_token::{digest_reset_token, generate_reset_token},
    },
    config::Config,
    error::{AppError, is_duplicate_key},
    mail::{EmailMessage, EmailSender, templates::PasswordResetMessage},
    model::{
        role::Role,
        user::{LeaveBalances, User},
    },
    models::{ForgotPasswordReq, LoginReqDto, RegisterReq, ResetPasswordReq, TokenType},
    utils::{email_cache, email_filter, notifier},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

const FORGOT_PASSWORD_REPLY: &str =
    "If an account with that email exists, a reset link has been sent.";

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> Result<bool, AppError> {
    // Cuckoo filter: a miss is definitive
    if !email_filter::might_exist(email) {
        return Ok(true);
    }

    // Moka cache: a hit is definitive
    if email_cache::is_taken(email).await {
        return Ok(false);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email_filter::normalize(email))
    .fetch_one(pool)
    .await?;

    if exists {
        email_cache::mark_taken(email).await;
    }

    Ok(!exists)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created, awaiting activation", body = Object,
         example = json!({ "message": "User registered successfully. Awaiting activation." })),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let req = payload.into_inner();

    let (Some(name), Some(email), Some(password), Some(gender), Some(date_of_birth)) = (
        non_empty(&req.name),
        non_empty(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
        req.gender,
        req.date_of_birth,
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let email = email_filter::normalize(email);

    if !is_email_available(&email, pool.get_ref()).await? {
        info!("Registration rejected: email already in use");
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    let hashed = hash_password(password)?;
    let balances = LeaveBalances::for_gender(gender);

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (name, email, password, role, gender, date_of_birth, is_active,
             annual_leave_balance, sick_leave_balance,
             maternity_leave_balance, paternity_leave_balance)
        VALUES (?, ?, ?, ?, ?, ?, FALSE, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(hashed)
    .bind(Role::Employee)
    .bind(gender)
    .bind(date_of_birth)
    .bind(balances.annual_leave_balance)
    .bind(balances.sick_leave_balance)
    .bind(balances.maternity_leave_balance)
    .bind(balances.paternity_leave_balance)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        if is_duplicate_key(&e) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        return Err(e.into());
    }

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    notifier::notify_privileged(
        pool.get_ref(),
        &notifier::registration_message(name, &email),
        None,
    )
    .await;

    info!(email = %email, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully. Awaiting activation."
    })))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

async fn store_refresh_token(
    pool: &MySqlPool,
    user_id: u64,
    jti: &str,
    exp: usize,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(jti)
    .bind(exp as i64)
    .execute(pool)
    .await?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is not active")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::validation("Email and password are required"));
    }

    let email = email_filter::normalize(&user.email);

    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, role, gender, date_of_birth, bio, is_active,
               annual_leave_balance, sick_leave_balance,
               maternity_leave_balance, paternity_leave_balance
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        info!("Invalid credentials: user not found");
        AppError::unauthorized("Invalid credentials")
    })?;

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    if !db_user.is_active {
        info!(user_id = db_user.id, "Login refused: account inactive");
        return Err(AppError::forbidden("Account is not active"));
    }

    let subject = TokenSubject {
        user_id: db_user.id,
        email: db_user.email.clone(),
        name: db_user.name.clone(),
        role: db_user.role,
    };

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)?;

    debug!(user_id = db_user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store_refresh_token(
        pool.get_ref(),
        db_user.id,
        &refresh_claims.jti,
        refresh_claims.exp,
    )
    .await?;

    // not fatal for the login
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }
    email_cache::mark_taken(&db_user.email).await;

    info!(user_id = db_user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        user: SessionUser {
            id: db_user.id,
            name: db_user.name,
            email: db_user.email,
            role: db_user.role,
        },
    }))
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[derive(sqlx::FromRow)]
struct StoredRefreshToken {
    id: u64,
    user_id: u64,
    revoked: bool,
}

#[derive(sqlx::FromRow)]
struct SessionOwner {
    name: String,
    email: String,
    role: Role,
    is_active: bool,
}

/// A refresh token is spent once; losing the revoke race means another
/// request already rotated it.
fn rotation_claimed(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 1 {
        Ok(())
    } else {
        debug!(rows_affected, "Refresh token already rotated");
        Err(AppError::unauthorized("Invalid or expired token"))
    }
}

/// Rotates the refresh token sent as the bearer credential.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = Object,
         example = json!({ "accessToken": "eyJ...", "refreshToken": "eyJ..." })),
        (status = 401, description = "Missing, revoked or expired refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[instrument(name = "auth_refresh", skip_all)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let token = bearer(&req).ok_or_else(|| AppError::unauthorized("No token"))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected refresh token");
        AppError::unauthorized("Invalid or expired token")
    })?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::unauthorized("Refresh token required"));
    }

    let record = sqlx::query_as::<_, StoredRefreshToken>(
        "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ?",
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await?;

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return Err(AppError::unauthorized("Invalid or expired token")),
    };

    // role and activation may have changed since the token was issued
    let owner = sqlx::query_as::<_, SessionOwner>(
        "SELECT name, email, role, is_active FROM users WHERE id = ?",
    )
    .bind(record.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .filter(|u| u.is_active)
    .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

    // only one concurrent refresh may claim the token
    let claimed = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE id = ? AND revoked = FALSE",
    )
    .bind(record.id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();
    rotation_claimed(claimed)?;

    let subject = TokenSubject {
        user_id: record.user_id,
        email: owner.email,
        name: owner.name,
        role: owner.role,
    };

    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)?;
    store_refresh_token(pool.get_ref(), record.user_id, &new_claims.jti, new_claims.exp).await?;

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)?;

    Ok(HttpResponse::Ok().json(json!({
        "accessToken": access_token,
        "refreshToken": new_refresh_token
    })))
}

/// Revokes the refresh token sent as the bearer credential. Always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Signed out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[derive(sqlx::FromRow)]
struct ResetCandidate {
    id: u64,
    email: String,
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Same reply whether or not the account exists", body = Object,
         example = json!({ "message": "If an account with that email exists, a reset link has been sent." })),
        (status = 400, description = "Email missing")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_forgot_password", skip_all)]
pub async fn forgot_password(
    payload: web::Json<ForgotPasswordReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    mailer: web::Data<EmailSender>,
) -> Result<HttpResponse, AppError> {
    let email = non_empty(&payload.email)
        .map(email_filter::normalize)
        .ok_or_else(|| AppError::validation("Email is required"))?;

    let candidate = sqlx::query_as::<_, ResetCandidate>("SELECT id, email FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await?;

    let Some(user) = candidate else {
        debug!("Password reset requested for unknown email");
        return Ok(HttpResponse::Ok().json(json!({ "message": FORGOT_PASSWORD_REPLY })));
    };

    let token = generate_reset_token();

    sqlx::query(
        r#"
        UPDATE users
        SET reset_password_token = ?,
            reset_password_token_expiry = NOW() + INTERVAL ? SECOND
        WHERE id = ?
        "#,
    )
    .bind(digest_reset_token(&token))
    .bind(config.reset_token_ttl)
    .bind(user.id)
    .execute(pool.get_ref())
    .await?;

    let lifetime = Duration::from_secs(config.reset_token_ttl.max(0) as u64);
    let message = EmailMessage {
        to: user.email,
        subject: "Password Reset Request".to_string(),
        html: PasswordResetMessage::generate(
            &config.password_reset_url(&token),
            &config.company_name,
            lifetime,
        ),
        attachments: Vec::new(),
    };

    mailer.send(message).await.map_err(AppError::internal)?;

    info!(user_id = user.id, "Password reset link sent");

    Ok(HttpResponse::Ok().json(json!({ "message": FORGOT_PASSWORD_REPLY })))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordReq,
    responses(
        (status = 200, description = "Password changed", body = Object,
         example = json!({ "message": "Password has been reset successfully." })),
        (status = 400, description = "Missing fields or invalid/expired token")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_reset_password", skip_all)]
pub async fn reset_password(
    payload: web::Json<ResetPasswordReq>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let (Some(token), Some(password)) = (
        non_empty(&payload.token),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("Token and password are required"));
    };

    let user_id = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT id FROM users
        WHERE reset_password_token = ?
          AND reset_password_token_expiry > NOW()
        "#,
    )
    .bind(digest_reset_token(token))
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::validation("Password reset token is invalid or has expired"))?;

    let hashed = hash_password(password)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE users
        SET password = ?,
            reset_password_token = NULL,
            reset_password_token_expiry = NULL
        WHERE id = ?
        "#,
    )
    .bind(hashed)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    // existing sessions end with the old password
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(user_id, "Password reset");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password has been reset successfully."
    })))
}
