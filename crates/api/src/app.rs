use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_user_auth, security_headers_middleware, trace_id,
};
use crate::routes::{check_in, events, health, registrations};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Organizer routes (require a bearer token)
    let organizer_routes = Router::new()
        .route(
            "/api/v1/events/:event_id/verify",
            post(check_in::verify_for_organizer),
        )
        .route(
            "/api/v1/events/:event_id/registrations",
            get(registrations::list_registrations),
        )
        .route(
            "/api/v1/events/:event_id/registrations/:registration_id/payload",
            get(registrations::get_registration_payload),
        )
        .route(
            "/api/v1/registrations/:registration_id/verification",
            post(registrations::set_verification),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Attendee and kiosk routes (no authentication)
    let attendee_routes = Router::new()
        .route("/api/v1/public/events/:slug", get(events::get_public_event))
        .route(
            "/api/v1/public/events/:slug/register",
            post(registrations::register_for_event),
        )
        .route(
            "/api/v1/public/verify-registration",
            post(check_in::verify_public),
        )
        .route(
            "/api/v1/public/verify/:event_id/:registration_id",
            get(registrations::get_verification_info).post(check_in::verify_link),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(attendee_routes)
        .merge(organizer_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
