//! In-memory surfaces that record what was drawn.
//!
//! Used for headless rehearsal of a story and throughout the tests.

use std::collections::{BTreeMap, BTreeSet};

use foundation::geo::{Camera, LonLat, PixelOffset};
use foundation::handles::{MarkerHandle, PopupHandle, VisualHandle};
use foundation::ids::LayerId;

use crate::chart::ChartLayout;
use crate::error::SurfaceError;
use crate::script::{AnnotationPoint, LineStyle, Popup};
use crate::surface::{ChartSurface, ChartVisibility, MapSurface, MoveCompletion};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLayer {
    pub style: LineStyle,
    pub coords: Vec<LonLat>,
    pub highlighted: bool,
    /// Number of times the highlight was switched on.
    pub pulses: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPopup {
    pub coord: LonLat,
    pub popup: Popup,
    pub offset: PixelOffset,
}

#[derive(Debug)]
pub struct RecordingMap {
    next_handle: u64,
    completion: MoveCompletion,
    fail_markers: bool,
    pub viewport: Option<Camera>,
    pub legend: String,
    pub date_range: String,
    pub markers: BTreeMap<MarkerHandle, AnnotationPoint>,
    pub popups: BTreeMap<PopupHandle, RecordedPopup>,
    pub layers: BTreeMap<LayerId, RecordedLayer>,
    /// Visibility of layers the story does not own (basemap overlays).
    pub shared_layers: BTreeMap<LayerId, bool>,
    pub exiting: BTreeSet<VisualHandle>,
    /// Ordered log of mutating calls, for ordering assertions.
    pub calls: Vec<String>,
}

impl Default for RecordingMap {
    fn default() -> Self {
        Self::new(MoveCompletion::Immediate)
    }
}

impl RecordingMap {
    pub fn new(completion: MoveCompletion) -> Self {
        Self {
            next_handle: 1,
            completion,
            fail_markers: false,
            viewport: None,
            legend: String::new(),
            date_range: String::new(),
            markers: BTreeMap::new(),
            popups: BTreeMap::new(),
            layers: BTreeMap::new(),
            shared_layers: BTreeMap::new(),
            exiting: BTreeSet::new(),
            calls: Vec::new(),
        }
    }

    /// Makes every subsequent `place_marker` fail.
    pub fn fail_markers(&mut self, fail: bool) {
        self.fail_markers = fail;
    }

    /// Total visuals and owned layers currently on the map.
    pub fn visual_count(&self) -> usize {
        self.markers.len() + self.popups.len() + self.layers.len()
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }
}

impl MapSurface for RecordingMap {
    fn set_viewport(
        &mut self,
        camera: &Camera,
        duration_ms: u64,
    ) -> Result<MoveCompletion, SurfaceError> {
        self.viewport = Some(*camera);
        self.calls.push(format!("viewport {duration_ms}"));
        Ok(self.completion)
    }

    fn set_captions(&mut self, legend: &str, date_range: &str) -> Result<(), SurfaceError> {
        self.legend = legend.to_string();
        self.date_range = date_range.to_string();
        Ok(())
    }

    fn add_line_layer(&mut self, id: &LayerId, style: &LineStyle) -> Result<(), SurfaceError> {
        if self.layers.contains_key(id) {
            return Err(SurfaceError::Rejected(format!("layer {id} already exists")));
        }
        self.layers.insert(
            id.clone(),
            RecordedLayer {
                style: style.clone(),
                coords: Vec::new(),
                highlighted: false,
                pulses: 0,
            },
        );
        self.calls.push(format!("add-layer {id}"));
        Ok(())
    }

    fn set_line_coords(&mut self, id: &LayerId, coords: &[LonLat]) -> Result<(), SurfaceError> {
        let layer = self
            .layers
            .get_mut(id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.to_string()))?;
        layer.coords = coords.to_vec();
        Ok(())
    }

    fn set_line_highlight(
        &mut self,
        id: &LayerId,
        highlighted: bool,
    ) -> Result<(), SurfaceError> {
        let layer = self
            .layers
            .get_mut(id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.to_string()))?;
        if highlighted && !layer.highlighted {
            layer.pulses += 1;
        }
        layer.highlighted = highlighted;
        Ok(())
    }

    fn set_layer_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), SurfaceError> {
        self.shared_layers.insert(id.clone(), visible);
        self.calls.push(format!("layer {id} visible={visible}"));
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        self.layers
            .remove(id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.to_string()))?;
        self.calls.push(format!("remove-layer {id}"));
        Ok(())
    }

    fn place_marker(&mut self, point: &AnnotationPoint) -> Result<MarkerHandle, SurfaceError> {
        if self.fail_markers {
            return Err(SurfaceError::Rejected("marker placement disabled".to_string()));
        }
        let handle = MarkerHandle(self.handle());
        self.markers.insert(handle, point.clone());
        self.calls.push(format!("marker {}", handle.0));
        Ok(handle)
    }

    fn place_popup(
        &mut self,
        coord: LonLat,
        popup: &Popup,
        offset: PixelOffset,
    ) -> Result<PopupHandle, SurfaceError> {
        let handle = PopupHandle(self.handle());
        self.popups.insert(
            handle,
            RecordedPopup {
                coord,
                popup: popup.clone(),
                offset,
            },
        );
        self.calls.push(format!("popup {}", handle.0));
        Ok(handle)
    }

    fn begin_exit(&mut self, visual: VisualHandle, _duration_ms: u64) {
        self.exiting.insert(visual);
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.exiting.remove(&VisualHandle::Marker(handle));
        self.markers.remove(&handle);
    }

    fn remove_popup(&mut self, handle: PopupHandle) {
        self.exiting.remove(&VisualHandle::Popup(handle));
        self.popups.remove(&handle);
    }
}

#[derive(Debug)]
pub struct RecordingChart {
    pub visibility: ChartVisibility,
    pub frames: Vec<ChartLayout>,
    /// Every visibility change, in order.
    pub visibility_log: Vec<ChartVisibility>,
}

impl Default for RecordingChart {
    fn default() -> Self {
        Self {
            visibility: ChartVisibility::Hidden,
            frames: Vec::new(),
            visibility_log: Vec::new(),
        }
    }
}

impl RecordingChart {
    pub fn last_frame(&self) -> Option<&ChartLayout> {
        self.frames.last()
    }
}

impl ChartSurface for RecordingChart {
    fn set_visibility(&mut self, visibility: ChartVisibility) {
        self.visibility = visibility;
        self.visibility_log.push(visibility);
    }

    fn render(&mut self, layout: &ChartLayout) {
        self.frames.push(layout.clone());
    }
}
