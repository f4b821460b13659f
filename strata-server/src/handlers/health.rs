use axum::response::Json;
use serde_json::{Value, json};

/// Liveness probe. Does not touch the image store.
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
