//! Wire DTOs for the client/server boundary.
//!
//! DESIGN
//! ======
//! Record shapes live in the shared `model` crate so client and server cannot
//! drift. This module re-exports them and adds the client-only error type.

pub use model::{
    AssociationKey, AssociationList, Collection, CollectionId, CurrentUser, Role, Source, SourceId,
};

/// Failure of a REST call as observed by the browser.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),
    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
    /// REST calls are only issued from the browser.
    #[error("not available on server")]
    Unavailable,
}
