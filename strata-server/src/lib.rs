//! # Strata Server
//!
//! HTTP front end of the Strata image registry. Exposes the image index,
//! detail listings and single-image CRUD over JSON, reading the caller's
//! scope from headers set by the identity proxy.

pub mod handlers;
pub mod infra;
pub mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use infra::app_state::AppState;

pub fn create_app(state: AppState) -> Router {
    routes::create_api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
