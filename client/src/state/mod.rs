//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by domain (`auth`, `associations`) so individual
//! components can depend on small focused models.

pub mod associations;
pub mod auth;
