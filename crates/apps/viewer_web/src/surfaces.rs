use serde_json::json;
use wasm_bindgen::JsValue;

use foundation::geo::{Camera, LonLat, PixelOffset};
use foundation::handles::{MarkerHandle, PopupHandle, VisualHandle};
use foundation::ids::LayerId;
use story::{
    AnnotationPoint, ChartLayout, ChartSurface, ChartVisibility, LineStyle, MapSurface,
    MoveCompletion, Popup, SurfaceError,
};

use crate::ffi;

fn rejected(err: JsValue) -> SurfaceError {
    SurfaceError::Rejected(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Map surface backed by the page's map glue.
///
/// Marker and popup handles share one counter so the glue can keep them in a
/// single table.
#[derive(Debug, Default)]
pub struct JsMap {
    next_handle: u32,
}

impl JsMap {
    fn handle(&mut self) -> u32 {
        self.next_handle = self.next_handle.wrapping_add(1);
        self.next_handle
    }
}

fn visual_id(visual: VisualHandle) -> u32 {
    match visual {
        VisualHandle::Marker(MarkerHandle(h)) | VisualHandle::Popup(PopupHandle(h)) => h as u32,
    }
}

pub fn coords_json(coords: &[LonLat]) -> String {
    let pairs: Vec<[f64; 2]> = coords.iter().map(|c| [c.lon, c.lat]).collect();
    json!(pairs).to_string()
}

impl MapSurface for JsMap {
    fn set_viewport(
        &mut self,
        camera: &Camera,
        duration_ms: u64,
    ) -> Result<MoveCompletion, SurfaceError> {
        ffi::fly_to(
            camera.center.lon,
            camera.center.lat,
            camera.zoom,
            camera.pitch,
            camera.bearing,
            duration_ms as f64,
        )
        .map_err(rejected)?;
        // The glue calls `viewport_settled` on the map's `moveend`.
        Ok(MoveCompletion::External)
    }

    fn set_captions(&mut self, legend: &str, date_range: &str) -> Result<(), SurfaceError> {
        ffi::set_captions(legend, date_range).map_err(rejected)
    }

    fn add_line_layer(&mut self, id: &LayerId, style: &LineStyle) -> Result<(), SurfaceError> {
        ffi::add_line_layer(id.as_str(), &style.color, style.width).map_err(rejected)
    }

    fn set_line_coords(&mut self, id: &LayerId, coords: &[LonLat]) -> Result<(), SurfaceError> {
        ffi::set_line_coords(id.as_str(), &coords_json(coords)).map_err(rejected)
    }

    fn set_line_highlight(
        &mut self,
        id: &LayerId,
        highlighted: bool,
    ) -> Result<(), SurfaceError> {
        ffi::set_line_highlight(id.as_str(), highlighted).map_err(rejected)
    }

    fn set_layer_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), SurfaceError> {
        ffi::set_layer_visible(id.as_str(), visible).map_err(rejected)
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        ffi::remove_layer(id.as_str()).map_err(rejected)
    }

    fn place_marker(&mut self, point: &AnnotationPoint) -> Result<MarkerHandle, SurfaceError> {
        let handle = self.handle();
        ffi::place_marker(
            handle,
            point.coord.lon,
            point.coord.lat,
            point.kind.css_class(),
            point.label.clone(),
            point.glow,
        )
        .map_err(rejected)?;
        Ok(MarkerHandle(u64::from(handle)))
    }

    fn place_popup(
        &mut self,
        coord: LonLat,
        popup: &Popup,
        offset: PixelOffset,
    ) -> Result<PopupHandle, SurfaceError> {
        let handle = self.handle();
        ffi::place_popup(
            handle,
            coord.lon,
            coord.lat,
            &popup.html,
            popup.image.clone(),
            popup.class.clone(),
            offset.x,
            offset.y,
        )
        .map_err(rejected)?;
        Ok(PopupHandle(u64::from(handle)))
    }

    fn begin_exit(&mut self, visual: VisualHandle, duration_ms: u64) {
        ffi::begin_exit(visual_id(visual), duration_ms as f64);
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        ffi::remove_visual(visual_id(VisualHandle::Marker(handle)));
    }

    fn remove_popup(&mut self, handle: PopupHandle) {
        ffi::remove_visual(visual_id(VisualHandle::Popup(handle)));
    }
}

/// Chart surface backed by the page's chart glue.
#[derive(Debug, Default)]
pub struct JsChart;

pub fn visibility_name(visibility: ChartVisibility) -> &'static str {
    match visibility {
        ChartVisibility::Visible => "visible",
        ChartVisibility::FadingOut => "fading-out",
        ChartVisibility::Hidden => "hidden",
    }
}

pub fn layout_json(layout: &ChartLayout) -> String {
    let bars: Vec<_> = layout
        .bars
        .iter()
        .map(|bar| {
            json!({
                "category": bar.category.label(),
                "value": bar.value,
                "width": bar.width_px,
                "label": bar.label,
                "percent": bar.percent_label,
            })
        })
        .collect();
    json!({
        "location": layout.location,
        "total": layout.total,
        "bars": bars,
    })
    .to_string()
}

impl ChartSurface for JsChart {
    fn set_visibility(&mut self, visibility: ChartVisibility) {
        ffi::chart_set_visibility(visibility_name(visibility));
    }

    fn render(&mut self, layout: &ChartLayout) {
        ffi::chart_render(&layout_json(layout));
    }
}

#[cfg(test)]
mod tests {
    use super::{coords_json, layout_json, visibility_name};
    use foundation::geo::LonLat;
    use story::{ChartLayout, ChartVisibility};

    #[test]
    fn coords_serialize_as_lon_lat_pairs() {
        let json = coords_json(&[LonLat::new(56.25, 26.5), LonLat::new(56.5, 26.0)]);
        assert_eq!(json, "[[56.25,26.5],[56.5,26.0]]");
    }

    #[test]
    fn layout_json_carries_labels() {
        let layout = ChartLayout::compute(&[100.0, 0.0, 0.0, 0.0, 200.0], "Test Region", 300.0);
        let value: serde_json::Value = serde_json::from_str(&layout_json(&layout)).expect("json");
        assert_eq!(value["location"], "Test Region");
        assert_eq!(value["bars"][0]["label"], "Light: 100");
        assert_eq!(value["bars"][1]["label"], "Detections: 200");
        assert_eq!(value["bars"][1]["width"], 150.0);
    }

    #[test]
    fn visibility_names_match_glue() {
        assert_eq!(visibility_name(ChartVisibility::FadingOut), "fading-out");
    }
}
