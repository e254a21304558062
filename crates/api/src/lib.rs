//! HTTP API server for the team workspace.
//!
//! Exposes every bounded context over REST, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use contexts::Services;
use domain::{DomainError, EventBus};
use metrics_exporter_prometheus::PrometheusHandle;
use storage::InMemoryDatabase;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::register))
        .route(
            "/users/{id}",
            get(routes::users::get)
                .patch(routes::users::update)
                .delete(routes::users::delete),
        )
        .route("/users/{id}/average-grade", get(routes::evaluations::average))
        .route("/users/{id}/meetings", get(routes::meetings::for_user))
        .route("/users/{id}/calendar", get(routes::calendar::all))
        .route("/users/{id}/calendar/day/{date}", get(routes::calendar::day))
        .route(
            "/users/{id}/calendar/month/{year}/{month}",
            get(routes::calendar::month),
        )
        .route("/teams", post(routes::teams::create))
        .route("/teams/{id}", get(routes::teams::get))
        .route("/teams/{id}/members", post(routes::teams::add_member))
        .route(
            "/teams/{id}/members/{user_id}",
            axum::routing::delete(routes::teams::remove_member).patch(routes::teams::change_role),
        )
        .route(
            "/tasks",
            get(routes::tasks::list).post(routes::tasks::create),
        )
        .route(
            "/tasks/{id}",
            get(routes::tasks::get).patch(routes::tasks::update),
        )
        .route("/tasks/{id}/executor", put(routes::tasks::assign))
        .route(
            "/tasks/{id}/comments",
            get(routes::tasks::comments).post(routes::tasks::add_comment),
        )
        .route("/evaluations/me", get(routes::evaluations::mine))
        .route(
            "/tasks/{id}/evaluation",
            get(routes::evaluations::get).post(routes::evaluations::create),
        )
        .route(
            "/meetings",
            get(routes::meetings::list).post(routes::meetings::create),
        )
        .route("/meetings/{id}", get(routes::meetings::get))
        .route(
            "/meetings/{id}/participants",
            post(routes::meetings::add_participant),
        )
        .route(
            "/meetings/{id}/participants/{user_id}",
            axum::routing::delete(routes::meetings::remove_participant),
        )
        .route("/meetings/{id}/cancel", post(routes::meetings::cancel))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires every context against a fresh in-memory database.
pub async fn create_default_state(config: &Config) -> Result<Arc<AppState>, DomainError> {
    let db = InMemoryDatabase::new();
    let bus = EventBus::with_max_depth(config.max_cascade_depth);
    let services = Services::bootstrap(Arc::new(db), bus).await?;
    Ok(Arc::new(AppState { services }))
}
