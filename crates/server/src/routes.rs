use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::state::AppState;

pub mod auth;
pub mod events;
pub mod notes;
pub mod reports;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (StatusCode, String) {
    match service::metrics::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Routes of the notes feature, relative to its mount path.
fn notes_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(notes::index).post(notes::create))
        .route("/count", get(notes::count))
        .route("/events", post(events::publish))
        .route("/:id", delete(notes::destroy))
        .route_layer(middleware::from_fn_with_state(state, auth::require_staff))
}

fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/reports/user_notes", get(reports::user_notes))
        .route_layer(middleware::from_fn_with_state(state, auth::require_staff))
}

/// Build the full application router. Feature routes are only mounted while
/// the feature is enabled.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let mut app = public;
    if state.settings.enabled {
        app = app
            .nest(&state.mount_path, notes_routes(state.clone()))
            .merge(report_routes(state.clone()));
    }

    app.with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request with method and path, at INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and friends at ERROR
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
