//! Network layer: wire DTOs and REST helpers.

pub mod api;
pub mod types;
