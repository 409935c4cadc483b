//! Bindings to the page's map and chart glue (`window.storyMap`,
//! `window.storyChart`). The glue owns the actual renderer; nothing here
//! keeps state.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = flyTo)]
    pub fn fly_to(
        lon: f64,
        lat: f64,
        zoom: f64,
        pitch: f64,
        bearing: f64,
        duration_ms: f64,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = setCaptions)]
    pub fn set_captions(legend: &str, date_range: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = addLineLayer)]
    pub fn add_line_layer(id: &str, color: &str, width: f64) -> Result<(), JsValue>;

    /// `coords_json` is a JSON array of `[lon, lat]` pairs.
    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = setLineCoords)]
    pub fn set_line_coords(id: &str, coords_json: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = setLineHighlight)]
    pub fn set_line_highlight(id: &str, highlighted: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = setLayerVisible)]
    pub fn set_layer_visible(id: &str, visible: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = removeLayer)]
    pub fn remove_layer(id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = placeMarker)]
    pub fn place_marker(
        handle: u32,
        lon: f64,
        lat: f64,
        class: &str,
        label: Option<String>,
        glow: bool,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = storyMap, js_name = placePopup)]
    pub fn place_popup(
        handle: u32,
        lon: f64,
        lat: f64,
        html: &str,
        image: Option<String>,
        class: Option<String>,
        offset_x: f64,
        offset_y: f64,
    ) -> Result<(), JsValue>;

    /// Starts the fade/scale-out transition of a marker or popup.
    #[wasm_bindgen(js_namespace = storyMap, js_name = beginExit)]
    pub fn begin_exit(handle: u32, duration_ms: f64);

    #[wasm_bindgen(js_namespace = storyMap, js_name = removeVisual)]
    pub fn remove_visual(handle: u32);

    /// `state` is one of `"visible"`, `"fading-out"`, `"hidden"`.
    #[wasm_bindgen(js_namespace = storyChart, js_name = setVisibility)]
    pub fn chart_set_visibility(state: &str);

    #[wasm_bindgen(js_namespace = storyChart, js_name = render)]
    pub fn chart_render(layout_json: &str);
}
