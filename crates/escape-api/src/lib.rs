//! Escape API /v1: answer submission and team progress over HTTP
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod state;
pub mod store;
pub mod submit;

pub use catalog::Catalog;
pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/rooms/{room_id}/teams/{team_id}/submit",
            post(handlers::submit_answer),
        )
        .route(
            "/v1/rooms/{room_id}/teams/{team_id}/progress",
            get(handlers::get_progress),
        )
        .route(
            "/v1/rooms/{room_id}/teams/{team_id}/stages/{stage_index}/contributions",
            get(handlers::get_contributions),
        )
        .route(
            "/v1/rooms/{room_id}/teams/{team_id}/reset",
            post(handlers::reset_progress),
        )
        .route("/v1/metrics", get(handlers::metrics))
        .route("/v1/health", get(handlers::health))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let addr = state.config.addr.clone();
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Escape API listening on {}", addr);
    axum::serve(listener, app).await
}
