use crate::{
    api::{employee, export, request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes. Accounts are provisioned by HR, so there is no
    // self-registration endpoint.
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
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
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/requests")
                    // /requests (merged overview of both kinds)
                    .service(web::resource("").route(web::get().to(request::request_overview)))
                    // /requests/leave
                    .service(
                        web::resource("/leave")
                            .route(web::get().to(request::list_leave))
                            .route(web::post().to(request::submit_leave)),
                    )
                    // /requests/overtime
                    .service(
                        web::resource("/overtime")
                            .route(web::get().to(request::list_overtime))
                            .route(web::post().to(request::submit_overtime)),
                    )
                    // /requests/cancellations (pending-cancellation queue)
                    .service(
                        web::resource("/cancellations")
                            .route(web::get().to(request::cancellation_queue)),
                    )
                    // /requests/{kind}/{id}
                    .service(
                        web::resource("/{kind}/{id}").route(web::get().to(request::get_request)),
                    )
                    .service(
                        web::resource("/{kind}/{id}/approve")
                            .route(web::put().to(request::approve_request)),
                    )
                    .service(
                        web::resource("/{kind}/{id}/reject")
                            .route(web::put().to(request::reject_request)),
                    )
                    .service(
                        web::resource("/{kind}/{id}/cancel")
                            .route(web::post().to(request::cancel_request)),
                    )
                    .service(
                        web::resource("/{kind}/{id}/cancellation/approve")
                            .route(web::put().to(request::approve_cancellation)),
                    )
                    .service(
                        web::resource("/{kind}/{id}/cancellation/reject")
                            .route(web::put().to(request::reject_cancellation)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(web::resource("/export").route(web::get().to(export::export_requests))),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
