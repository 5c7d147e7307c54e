//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render directory chrome and collection contents while reading
//! shared state from Leptos context providers.

pub mod collection_source_list;
pub mod directory_search;
pub mod featured_collections;
pub mod permission_gate;
pub mod source_item;
