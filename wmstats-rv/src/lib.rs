//! wmstats-rv library - request status view
//!
//! Fetches request documents from the WMStats CouchDB views, merges the
//! request-registry and execution-agent records per request, derives the
//! status counters and serves the resulting table over HTTP.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod couch;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod metrics;
pub mod resolve;
pub mod view;

pub use error::{Error, Result};

use fetch::{FetchOrchestrator, RenderCycles};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// View fetcher for render cycles
    pub orchestrator: Arc<FetchOrchestrator>,
    /// Generation counter and last published table
    pub cycles: Arc<RenderCycles>,
}

impl AppState {
    /// Create new application state
    pub fn new(orchestrator: FetchOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            cycles: Arc::new(RenderCycles::new()),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/api/requests", get(api::get_requests))
        .route("/api/requests/latest", get(api::get_latest_requests));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
