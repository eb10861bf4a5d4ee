//! arview Web - WASM frontend
//!
//! Fetches the model catalog from the server, connects to the page's marker
//! tracker when one is present and runs the Bevy viewer.

mod app;
mod catalog;
mod tracker;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build()
    );

    // The catalog decides what the scene plugins set up, so fetch it first
    wasm_bindgen_futures::spawn_local(async {
        let settings = catalog::load_settings().await;
        app::run(settings);
    });
}
