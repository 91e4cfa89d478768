use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{role::Role, user::UserSummary},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

async fn fetch_summary(pool: &MySqlPool, user_id: u64) -> Result<Option<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email, role, is_active, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All accounts, newest first", body = [UserSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, name, email, role, is_active, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Activates/deactivates an account or changes its role.
#[utoipa::path(
    patch,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Account to update")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated account", body = UserSummary),
        (status = 400, description = "Neither isActive nor role given"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let user_id = path.into_inner();

    if payload.is_active.is_none() && payload.role.is_none() {
        return Err(AppError::validation("Invalid input"));
    }

    let mut builder: QueryBuilder<MySql> = QueryBuilder::new("UPDATE users SET ");
    let mut fields = builder.separated(", ");
    if let Some(is_active) = payload.is_active {
        fields.push("is_active = ").push_bind_unseparated(is_active);
    }
    if let Some(role) = payload.role {
        fields.push("role = ").push_bind_unseparated(role);
    }
    builder.push(" WHERE id = ").push_bind(user_id);

    let result = builder.build().execute(pool.get_ref()).await?;

    // MySQL reports 0 affected rows when the values are unchanged
    if result.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(pool.get_ref())
            .await?;
        if !exists {
            return Err(AppError::not_found("User not found"));
        }
    }

    tracing::info!(
        updated_by = auth.user_id,
        user_id,
        is_active = ?payload.is_active,
        role = ?payload.role,
        "User updated"
    );

    let user = fetch_summary(pool.get_ref(), user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::auth_middleware;
    use crate::config::Config;
    use crate::testing::{bearer_for, lazy_pool};
    use actix_web::{App, http::StatusCode, middleware::from_fn, test};
    use serde_json::json;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(Config::for_tests()))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/users", web::get().to(list_users))
                            .route("/users/{id}", web::patch().to(update_user)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn employees_cannot_list_users() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/users")
            .insert_header(("Authorization", bearer_for(3, Role::Employee)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn update_needs_at_least_one_field() {
        let app = app!();
        let req = test::TestRequest::patch()
            .uri("/api/users/9")
            .insert_header(("Authorization", bearer_for(1, Role::Admin)))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
