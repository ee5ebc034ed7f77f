//! Tonearm web player client.
//!
//! Fetches the song listing from the library service, renders it, and drives
//! playback through the browser's native audio element. State transitions are
//! pure and live in [`state`]; [`app`] binds them to the DOM.

pub mod api;
pub mod app;
pub mod state;

use wasm_bindgen::prelude::*;

/// Entry point, called automatically when the WASM module loads.
#[wasm_bindgen(start)]
pub fn start() {
    // Better panic messages in the browser console
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    match app::App::mount() {
        Ok(app) => app::dispatch(&app, state::Action::RefreshLibrary),
        Err(e) => tracing::error!(error = ?e, "Failed to mount player"),
    }
}
