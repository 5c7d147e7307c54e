//! REST API helpers for communicating with the server.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning `None`/[`ApiError::Unavailable`] since
//! these endpoints are only meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Option`/`Result` so a failed fetch moves the affected
//! view into its failed state instead of aborting hydration.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;

use super::types::{ApiError, AssociationKey, AssociationList, Collection, CollectionId, CurrentUser};
use crate::state::associations::AssociationClient;

pub(crate) fn collection_associations_endpoint(collection_id: CollectionId) -> String {
    format!("/api/sources/sources-collections/{collection_id}?collection=true")
}

pub(crate) fn remove_association_endpoint(key: AssociationKey) -> String {
    format!(
        "/api/sources/sources-collections/{}?collection_id={}",
        key.source_id, key.collection_id
    )
}

pub(crate) fn collection_endpoint(collection_id: CollectionId) -> String {
    format!("/api/collections/{collection_id}")
}

#[cfg(feature = "hydrate")]
async fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
}

/// Fetch the signed-in user from `/api/auth/me`.
/// Returns `None` for anonymous visitors or on the server.
pub async fn fetch_current_user() -> Option<CurrentUser> {
    #[cfg(feature = "hydrate")]
    {
        get_json::<CurrentUser>("/api/auth/me").await.ok()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

/// Fetch one collection's metadata.
///
/// # Errors
///
/// Returns an [`ApiError`] if the request fails or the collection is missing.
pub async fn fetch_collection(collection_id: CollectionId) -> Result<Collection, ApiError> {
    #[cfg(feature = "hydrate")]
    {
        get_json(&collection_endpoint(collection_id)).await
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = collection_endpoint(collection_id);
        Err(ApiError::Unavailable)
    }
}

/// Fetch the collections promoted on the directory landing page.
///
/// # Errors
///
/// Returns an [`ApiError`] if the request fails.
pub async fn fetch_featured_collections() -> Result<Vec<Collection>, ApiError> {
    #[cfg(feature = "hydrate")]
    {
        get_json("/api/collections/featured").await
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err(ApiError::Unavailable)
    }
}

/// [`AssociationClient`] backed by the server's REST endpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpAssociationClient;

#[async_trait(?Send)]
impl AssociationClient for HttpAssociationClient {
    async fn fetch_associations(&self, collection_id: CollectionId) -> Result<AssociationList, ApiError> {
        let url = collection_associations_endpoint(collection_id);
        #[cfg(feature = "hydrate")]
        {
            get_json(&url).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = url;
            Err(ApiError::Unavailable)
        }
    }

    async fn remove_association(&self, key: AssociationKey) -> Result<(), ApiError> {
        let url = remove_association_endpoint(key);
        #[cfg(feature = "hydrate")]
        {
            let resp = gloo_net::http::Request::delete(&url)
                .send()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            if !resp.ok() {
                return Err(ApiError::Status(resp.status()));
            }
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = url;
            Err(ApiError::Unavailable)
        }
    }
}
