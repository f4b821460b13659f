use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use strata_model::{ImageId, ImageRecord, ImageSummary, ImageUpdate, NewImage};
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    listing::ListingQuery,
    scope::CallerScope,
};

/// Header asking an update to drop every property it does not supply.
pub const PURGE_PROPS_HEADER: &str = "x-registry-purge-props";

/// `{"image": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEnvelope<T> {
    pub image: T,
}

/// `{"images": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageList<T> {
    pub images: Vec<T>,
}

/// `GET /images`: one page of summaries.
pub async fn index(
    State(state): State<AppState>,
    caller: CallerScope,
    ListingQuery(spec): ListingQuery,
) -> AppResult<Json<ImageList<ImageSummary>>> {
    let images = state.catalog.list(&spec, caller.scope()).await?;
    debug!(count = images.len(), "Listed image summaries");
    Ok(Json(ImageList { images }))
}

/// `GET /images/detail`: one page of full records.
pub async fn detail(
    State(state): State<AppState>,
    caller: CallerScope,
    ListingQuery(spec): ListingQuery,
) -> AppResult<Json<ImageList<ImageRecord>>> {
    let images = state.catalog.list_detail(&spec, caller.scope()).await?;
    debug!(count = images.len(), "Listed image details");
    Ok(Json(ImageList { images }))
}

pub async fn show(
    State(state): State<AppState>,
    caller: CallerScope,
    Path(raw_id): Path<String>,
) -> AppResult<Json<ImageEnvelope<ImageRecord>>> {
    let id = parse_id(&raw_id)?;
    let image = state.catalog.get_detail(id, caller.scope()).await?;
    Ok(Json(ImageEnvelope { image }))
}

pub async fn create(
    State(state): State<AppState>,
    caller: CallerScope,
    Json(payload): Json<ImageEnvelope<NewImage>>,
) -> AppResult<(StatusCode, Json<ImageEnvelope<ImageRecord>>)> {
    let scope = caller.require_writer()?;
    let image = state.catalog.create(payload.image, scope).await?;
    Ok((StatusCode::CREATED, Json(ImageEnvelope { image })))
}

pub async fn update(
    State(state): State<AppState>,
    caller: CallerScope,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ImageEnvelope<ImageUpdate>>,
) -> AppResult<Json<ImageEnvelope<ImageRecord>>> {
    let id = parse_id(&raw_id)?;
    let scope = caller.require_writer()?;
    let purge_props = headers
        .get(PURGE_PROPS_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

    let image = state
        .catalog
        .update(id, payload.image, purge_props, scope)
        .await?;
    Ok(Json(ImageEnvelope { image }))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: CallerScope,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&raw_id)?;
    let scope = caller.require_writer()?;
    state.catalog.delete(id, scope).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ids that are not integers cannot name an image.
fn parse_id(raw: &str) -> AppResult<ImageId> {
    raw.parse::<ImageId>()
        .map_err(|_| AppError::not_found(format!("No image found with ID {raw}")))
}
