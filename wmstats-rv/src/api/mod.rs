//! HTTP API handlers for wmstats-rv

pub mod health;
pub mod requests;
pub mod ui;

pub use health::health_routes;
pub use requests::{get_latest_requests, get_requests};
pub use ui::{serve_app_js, serve_index};
