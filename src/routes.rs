use crate::{
    api::{attendance, employee, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

/// Employee, attendance and payroll routes; everything sits behind bearer auth.
pub fn api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            // /employees
            .service(
                web::resource("")
                    .route(web::post().to(employee::create_employee))
                    .route(web::get().to(employee::list_employees)),
            )
            .service(web::resource("/chart").route(web::get().to(employee::employee_chart)))
            .service(web::resource("/serialized").route(web::get().to(employee::list_by_rate)))
            // /employees/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(employee::get_employee))
                    .route(web::put().to(employee::update_employee))
                    .route(web::delete().to(employee::delete_employee)),
            ),
    )
    .service(
        web::scope("/attendance")
            .service(web::resource("/day").route(web::post().to(attendance::day_snapshot)))
            .service(web::resource("/mark").route(web::post().to(attendance::bulk_mark)))
            .service(web::resource("/monthly").route(web::get().to(attendance::monthly)))
            // /attendance/{employee_id}
            .service(web::resource("/{id}").route(web::put().to(attendance::mark_day)))
            .service(
                web::resource("/{id}/monthly").route(web::get().to(attendance::employee_monthly)),
            ),
    )
    .service(
        web::scope("/payroll")
            .service(web::resource("").route(web::get().to(payroll::compute_payroll))),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scope = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware))
        .configure(api);

    // Protected routes, rate limited per peer IP when a limiter can be built
    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter)),
        None => {
            tracing::warn!(
                rate = config.rate_protected_per_min,
                "Rate limiter misconfigured; serving without it"
            );
            cfg.service(scope)
        }
    };
}
