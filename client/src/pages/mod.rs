//! Route-level pages.

pub mod collection;
pub mod directory;
