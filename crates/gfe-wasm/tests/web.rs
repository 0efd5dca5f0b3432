//! Browser-side tests, run with `wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use gfe_wasm::{FilterMode, WasmGraphicalFilterEditor};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_kernel_and_curves_cross_the_boundary() {
    let mut editor = WasmGraphicalFilterEditor::new(1024, 48000, false).unwrap();
    editor.change_zone_y(0, 150, 120).unwrap();
    editor.update_filter(0, false, false).unwrap();
    editor.update_actual_channel_curve(0).unwrap();

    assert_eq!(editor.filter_kernel(0).unwrap().length(), 1024);
    assert_eq!(editor.channel_curve(0).unwrap().get_index(150), 120);
    assert_eq!(editor.actual_channel_curve().length(), 500);
}

#[wasm_bindgen_test]
fn test_invalid_channel_is_an_error() {
    let mut editor = WasmGraphicalFilterEditor::new(512, 44100, false).unwrap();
    assert!(editor.change_zone_y(2, 0, 0).is_err());
    assert!(editor.channel_curve(7).is_err());
}

#[wasm_bindgen_test]
fn test_mode_needs_host_support() {
    let mut plain = WasmGraphicalFilterEditor::new(512, 44100, false).unwrap();
    assert!(!plain.change_mode(FilterMode::Shelf, 0, false).unwrap());
    assert_eq!(plain.mode(), FilterMode::Convolution);

    let mut full = WasmGraphicalFilterEditor::new(512, 44100, true).unwrap();
    assert!(full.change_mode(FilterMode::Peaking, 0, false).unwrap());
    assert_eq!(full.iir_parameters(0).unwrap().len(), 30);
}

#[wasm_bindgen_test]
fn test_curve_text_roundtrip() {
    let mut editor = WasmGraphicalFilterEditor::from_config_json(r#"{"filter_length": 256}"#, false).unwrap();
    editor.change_point_y(1, 42, 10).unwrap();
    let text = editor.encode_channel_curve(1).unwrap();
    assert!(editor.load_channel_curve(0, &text).unwrap());
    assert_eq!(editor.channel_curve(0).unwrap().get_index(42), 10);
}

#[wasm_bindgen_test]
fn test_frequency_group_is_bin_and_zone_center() {
    let editor = WasmGraphicalFilterEditor::new(512, 44100, false).unwrap();
    let bin = 140;
    assert_eq!(
        editor.visible_bin_to_frequency_group(bin),
        vec![editor.visible_bin_to_frequency(bin), 1000]
    );
}
