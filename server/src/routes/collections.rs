//! Collection metadata routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use model::{Collection, CollectionId};

use super::associations::directory_error_to_status;
use crate::state::AppState;

/// `GET /api/collections/featured` — collections promoted on the landing page.
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Collection>>, StatusCode> {
    let collections = state
        .repo
        .featured_collections()
        .await
        .map_err(directory_error_to_status)?;
    Ok(Json(collections))
}

/// `GET /api/collections/:id` — fetch one collection.
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Collection>, StatusCode> {
    let collection = state
        .repo
        .collection(CollectionId(id))
        .await
        .map_err(directory_error_to_status)?;
    Ok(Json(collection))
}
