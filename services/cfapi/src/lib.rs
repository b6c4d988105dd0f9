//! GEOS-CF query service.
//!
//! Validates requests against the dataset catalog, resolves the backing file
//! and returns a JSON subset.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root::root_handler))
        .route("/login", get(handlers::login::login_handler))
        // Catalog queries, with and without trailing slash
        .route("/cfapi/:mode", get(handlers::query::cfapi_handler))
        .route("/cfapi/:mode/", get(handlers::query::cfapi_handler))
        .route("/cfapi/:mode/:grp", get(handlers::query::cfapi_handler))
        .route("/cfapi/:mode/:grp/", get(handlers::query::cfapi_handler))
        .route(
            "/cfapi/:mode/:grp/:level",
            get(handlers::query::cfapi_handler),
        )
        .route(
            "/cfapi/:mode/:grp/:level/",
            get(handlers::query::cfapi_handler),
        )
        .route("/data/:lat/:lon", get(handlers::legacy::legacy_handler))
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
