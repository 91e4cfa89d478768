use crate::{
    api::{
        dashboard, leave_request, notifications, overtime_request, profile, requests, users,
        verify,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Replenish interval for a per-minute quota, never below 1ms.
fn replenish_period_ms(requests_per_min: u32) -> u64 {
    (60_000 / u64::from(requests_per_min.max(1))).max(1)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(replenish_period_ms(requests_per_min))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let reset_limiter = Arc::new(build_limiter(config.rate_password_reset_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/forgot-password")
                    .wrap(reset_limiter.clone())
                    .route(web::post().to(handlers::forgot_password)),
            )
            .service(
                web::resource("/reset-password")
                    .wrap(reset_limiter.clone())
                    .route(web::post().to(handlers::reset_password)),
            ),
    );

    cfg.service(
        web::scope("/verify")
            .wrap(protected_limiter.clone())
            .route("/overtime/{id}", web::get().to(verify::verify_overtime))
            .route("/{id}", web::get().to(verify::verify_leave)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .route("/dashboard", web::get().to(dashboard::dashboard))
            .service(
                web::resource("/profile")
                    .route(web::get().to(profile::get_profile))
                    .route(web::patch().to(profile::update_bio)),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("").route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/history (before /leave/{id})
                    .service(
                        web::resource("/history")
                            .route(web::get().to(leave_request::leave_history)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(leave_request::get_leave)),
                    )
                    .service(
                        web::resource("/{id}/download-pdf")
                            .route(web::get().to(leave_request::download_pdf)),
                    ),
            )
            .service(
                web::scope("/overtime")
                    .service(
                        web::resource("")
                            .route(web::post().to(overtime_request::create_overtime)),
                    )
                    .service(
                        web::resource("/history")
                            .route(web::get().to(overtime_request::overtime_history)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(overtime_request::get_overtime)),
                    ),
            )
            .service(
                web::scope("/requests")
                    .route("/pending", web::get().to(requests::pending_requests))
                    .route("/my-history", web::get().to(requests::my_history))
                    .route("/update", web::patch().to(requests::update_status)),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(users::list_users)))
                    .service(web::resource("/{id}").route(web::patch().to(users::update_user))),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(notifications::list_notifications)),
                    )
                    .service(
                        web::resource("/details/{id}")
                            .route(web::get().to(notifications::notification_details)),
                    )
                    .service(
                        web::resource("/{id}/mark-read")
                            .route(web::patch().to(notifications::mark_read)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with Authorization: Bearer refresh_token
//       └─ returns a new access + refresh pair

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replenish_period_never_reaches_zero() {
        assert_eq!(replenish_period_ms(0), 60_000);
        assert_eq!(replenish_period_ms(60), 1_000);
        assert_eq!(replenish_period_ms(60_000), 1);
        assert_eq!(replenish_period_ms(120_000), 1);
        assert_eq!(replenish_period_ms(u32::MAX), 1);
    }

    #[actix_web::test]
    async fn very_high_rates_still_configure() {
        let mut config = Config::for_tests();
        config.rate_protected_per_min = 1_000_000;
        config.rate_login_per_min = 600_000;

        let _app = actix_web::test::init_service(
            actix_web::App::new().configure(|cfg| configure(cfg, config.clone())),
        )
        .await;
    }
}
