// Browser tests; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use beansaver::selector::{LOAD_COUNT_KEY, SelectionState};
use beansaver::{Cone, KeyValueStore, MemoryStore};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn fireworks_without_layer_is_a_noop() {
    // No `canvas.lower` exists in the test page; the call must not panic.
    beansaver::fireworks(10.0, 10.0, Some("up".into()));
    beansaver::fireworks(10.0, 10.0, None);
}

#[wasm_bindgen_test]
fn start_without_canvases_degrades() {
    // Missing canvases are logged, not raised.
    assert!(beansaver::start_beansaver().is_ok());
}

#[wasm_bindgen_test]
fn selection_state_round_trips_in_memory() {
    let mut store = MemoryStore::default();
    store.set(LOAD_COUNT_KEY, "7");
    assert_eq!(SelectionState::load(&store).load_count, 7);
    assert_eq!(Cone::parse("left"), Some(Cone::Left));
}
