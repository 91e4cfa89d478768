use crate::{auth::auth::AuthUser, error::AppError, model::user::Profile};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateBio {
    #[schema(example = "Backend engineer, coffee enthusiast.")]
    pub bio: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Caller's profile and balances", body = Profile),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT name, email, role, gender, date_of_birth, bio,
               annual_leave_balance, sick_leave_balance,
               maternity_leave_balance, paternity_leave_balance
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateBio,
    responses(
        (status = 200, description = "Bio updated", body = Object,
         example = json!({ "bio": "Backend engineer, coffee enthusiast." })),
        (status = 400, description = "Invalid bio format"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_bio(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateBio>,
) -> Result<HttpResponse, AppError> {
    let bio = payload
        .into_inner()
        .bio
        .ok_or_else(|| AppError::validation("Invalid bio format"))?;

    let result = sqlx::query("UPDATE users SET bio = ? WHERE id = ?")
        .bind(&bio)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await?;

    tracing::debug!(user_id = auth.user_id, rows = result.rows_affected(), "Bio updated");

    Ok(HttpResponse::Ok().json(json!({ "bio": bio })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::auth_middleware;
    use crate::config::Config;
    use crate::model::role::Role;
    use crate::testing::{bearer_for, lazy_pool};
    use actix_web::{App, http::StatusCode, middleware::from_fn, test};

    #[actix_web::test]
    async fn bio_is_required() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .route("/profile", web::patch().to(update_bio)),
                ),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/api/profile")
            .insert_header(("Authorization", bearer_for(6, Role::Employee)))
            .set_json(json!({ "name": "Someone Else" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid bio format");
    }
}
