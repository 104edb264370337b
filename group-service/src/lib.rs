pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::from_fn,
    routing::{get, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::GroupServiceConfig;
use services::{GroupDirectory, MembershipReconciler};

pub use startup::Application;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GroupServiceConfig,
    pub directory: GroupDirectory,
    pub reconciler: MembershipReconciler,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/admin/groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route(
            "/admin/groups/:name",
            get(handlers::get_group)
                .put(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .route(
            "/admin/groups/:name/users/:user_id",
            put(handlers::add_user_to_group).delete(handlers::remove_user_from_group),
        )
        .route(
            "/admin/users/:user_id/groups",
            get(handlers::get_user_groups).put(handlers::update_membership),
        )
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
