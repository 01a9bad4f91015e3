//! Beansaver core crate.
//!
//! A bean image bounces around the page DVD-screensaver style and, on each
//! bounce, sets off a burst of particles. The simulation modules (`selector`,
//! `bbox`, `bounce`, `fireworks`) are plain Rust and run anywhere; `page` wires
//! them to the browser through web-sys.

use wasm_bindgen::prelude::*;

pub mod assets;
pub mod bbox;
pub mod bounce;
pub mod config;
pub mod error;
pub mod fireworks;
mod logging;
mod page;
pub mod selector;

pub use bbox::{BoundingBox, compute_bounding_box};
pub use bounce::{BounceDirection, Collision, Simulator, Sprite, Viewport};
pub use error::{Error, Result};
pub use fireworks::{Burst, Cone, Fireworks, Particle};
pub use selector::{ImageRef, ImageSelector, KeyValueStore, MemoryStore, SelectionState};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init();
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Choose a bean, load it and start both animation layers.
#[wasm_bindgen]
pub fn start_beansaver() -> std::result::Result<(), JsValue> {
    page::start().map_err(JsValue::from)
}

/// Fire a burst on the fireworks canvas. `direction` is one of
/// `up`/`down`/`left`/`right`/`any`; anything else spreads in all directions.
#[wasm_bindgen]
pub fn fireworks(x: f64, y: f64, direction: Option<String>) {
    let cone = direction
        .as_deref()
        .and_then(Cone::parse)
        .unwrap_or_default();
    page::fire_burst(x, y, cone);
}
