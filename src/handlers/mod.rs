pub mod auth;
pub mod bookings;
pub mod calendar;
pub mod health;
pub mod resources;
pub mod reviews;
pub mod session;
pub mod slots;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let Some(origin) = allowed_origin else {
        return CorsLayer::new();
    };
    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-xsrf-token"),
            ]),
        Err(e) => {
            tracing::warn!(origin, error = %e, "ignoring invalid ALLOWED_ORIGIN");
            CorsLayer::new()
        }
    }
}

/// The full API, mounted under `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.allowed_origin.as_deref());

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/resources", get(resources::list).post(resources::create))
        .route("/resources/:id", get(resources::get_one))
        .route(
            "/resources/:id/availability",
            get(slots::list).post(slots::create),
        )
        .route("/resources/:id/reviews", get(reviews::list).post(reviews::create))
        .route("/availability/:id/status", put(slots::update_status))
        .route("/bookings", post(bookings::create))
        .route("/bookings/customer/:id", get(bookings::for_customer))
        .route("/bookings/provider/me", get(bookings::for_provider))
        .route("/bookings/:id/cancel", put(bookings::cancel))
        .route("/bookings/:id/calendar.ics", get(calendar::download_ics))
        .route("/provider/earnings", get(bookings::provider_earnings))
        .route("/admin/bookings", get(bookings::all))
        .route("/reviews/:id", put(reviews::update).delete(reviews::delete));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
