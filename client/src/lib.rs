//! # client
//!
//! Leptos + WASM frontend for the media directory.
//!
//! This crate contains the directory pages, the collection/source association
//! views, client-side query state, and the REST client used to talk to the
//! `server` crate.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;

/// WASM entry point: installs logging and hydrates the server-rendered app.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
