//! Source/collection association routes.

#[cfg(test)]
#[path = "associations_test.rs"]
mod associations_test;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use model::{AssociationKey, CollectionId, Role, SourceId};
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use crate::services::directory::DirectoryError;
use crate::state::AppState;

pub(crate) fn directory_error_to_status(err: DirectoryError) -> StatusCode {
    match err {
        DirectoryError::CollectionNotFound(_)
        | DirectoryError::SourceNotFound(_)
        | DirectoryError::AssociationNotFound(_) => StatusCode::NOT_FOUND,
        DirectoryError::Database(e) => {
            tracing::error!(error = %e, "directory query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssociationViewQuery {
    /// `true`: the path id is a collection and sources are listed.
    /// Otherwise the path id is a source and its collections are listed.
    #[serde(default)]
    pub collection: bool,
}

#[derive(Debug, Serialize)]
pub struct SourceCollectionsResponse {
    pub collections: Vec<model::Collection>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveAssociationQuery {
    pub collection_id: i64,
}

/// `GET /api/sources/sources-collections/:id` — list one side of the
/// association for a collection (`?collection=true`) or a source.
pub async fn list_associations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<AssociationViewQuery>,
) -> Result<Response, StatusCode> {
    if query.collection {
        let list = state
            .repo
            .collection_sources(CollectionId(id))
            .await
            .map_err(directory_error_to_status)?;
        tracing::debug!(collection_id = id, count = list.len(), "listed collection sources");
        Ok(Json(list).into_response())
    } else {
        let collections = state
            .repo
            .source_collections(SourceId(id))
            .await
            .map_err(directory_error_to_status)?;
        Ok(Json(SourceCollectionsResponse { collections }).into_response())
    }
}

/// `DELETE /api/sources/sources-collections/:source_id?collection_id=` —
/// remove one association. Staff only.
pub async fn remove_association(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(source_id): Path<i64>,
    Query(query): Query<RemoveAssociationQuery>,
) -> Result<StatusCode, StatusCode> {
    auth.require(Role::Staff)?;

    let key = AssociationKey { source_id: SourceId(source_id), collection_id: CollectionId(query.collection_id) };
    state
        .repo
        .remove_association(key)
        .await
        .map_err(directory_error_to_status)?;

    tracing::info!(source_id, collection_id = query.collection_id, user_id = %auth.user.id, "association removed");
    Ok(StatusCode::NO_CONTENT)
}
