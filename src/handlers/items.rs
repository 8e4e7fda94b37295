use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::middleware::ValidItem;
use crate::types::Item;
use crate::{TrackerError, router::TrackerState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

/// POST /items
pub async fn create_item(
    State(state): State<TrackerState>,
    ValidItem(draft): ValidItem,
) -> Result<Json<Item>, TrackerError> {
    Ok(Json(state.items.save_item(draft).await?))
}

/// GET /items/{id} -> 404 with an empty body when absent.
pub async fn get_item(
    State(state): State<TrackerState>,
    Path(id): Path<i64>,
) -> Result<Response, TrackerError> {
    match state.items.find_by_id(id).await? {
        Some(item) => Ok(Json(item).into_response()),
        None => {
            debug!(id, "item lookup missed");
            Ok(StatusCode::NOT_FOUND.into_response())
        }
    }
}

/// GET /items
pub async fn list_items(State(state): State<TrackerState>) -> Result<Json<Vec<Item>>, TrackerError> {
    Ok(Json(state.items.find_all().await?))
}

/// GET /items/status/{status}
pub async fn items_by_status(
    State(state): State<TrackerState>,
    Path(status): Path<String>,
) -> Result<Json<Vec<Item>>, TrackerError> {
    Ok(Json(state.items.find_by_status(&status).await?))
}

/// GET /items/tag/{tag}
pub async fn items_by_tag(
    State(state): State<TrackerState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Item>>, TrackerError> {
    Ok(Json(state.items.find_by_tag(&tag).await?))
}

/// GET /items/search?name=
pub async fn search_items(
    State(state): State<TrackerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, TrackerError> {
    Ok(Json(state.items.find_by_name(&query.name).await?))
}

/// PUT /items/{id}
pub async fn update_item(
    State(state): State<TrackerState>,
    Path(id): Path<i64>,
    ValidItem(draft): ValidItem,
) -> Result<Json<Item>, TrackerError> {
    Ok(Json(state.items.update_item(id, draft).await?))
}

/// DELETE /items/{id} -> 200 with an empty body, even for an absent id.
pub async fn delete_item(
    State(state): State<TrackerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, TrackerError> {
    state.items.delete_item(id).await?;
    Ok(StatusCode::OK)
}
