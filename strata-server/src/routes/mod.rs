use axum::{Router, routing::get};

use crate::{
    AppState,
    handlers::{health, images},
};

/// Registry routes. `/` is an alias for the image index.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(images::index))
        .route("/ping", get(health::ping))
        .route("/images", get(images::index).post(images::create))
        .route("/images/detail", get(images::detail))
        .route(
            "/images/{id}",
            get(images::show).put(images::update).delete(images::delete),
        )
}
