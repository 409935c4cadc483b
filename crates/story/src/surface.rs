//! Capability interfaces for the external map and chart renderers.
//!
//! Choreography only ever talks to these traits, so it runs the same against
//! a browser map, a headless recorder, or a test double.

use foundation::geo::{Camera, LonLat, PixelOffset};
use foundation::handles::{MarkerHandle, PopupHandle, VisualHandle};
use foundation::ids::LayerId;

use crate::chart::ChartLayout;
use crate::error::SurfaceError;
use crate::script::{AnnotationPoint, LineStyle, Popup};

/// How a viewport change reports completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveCompletion {
    /// The camera is already in place.
    Immediate,
    /// The move finishes after a known duration.
    AfterMs(u64),
    /// The host will call `Presentation::viewport_settled` when the move ends.
    External,
}

pub trait MapSurface {
    fn set_viewport(
        &mut self,
        camera: &Camera,
        duration_ms: u64,
    ) -> Result<MoveCompletion, SurfaceError>;

    /// Updates the legend and date-range captions shown over the map.
    fn set_captions(&mut self, legend: &str, date_range: &str) -> Result<(), SurfaceError>;

    fn add_line_layer(&mut self, id: &LayerId, style: &LineStyle) -> Result<(), SurfaceError>;

    /// Replaces the drawn coordinates of a line layer.
    fn set_line_coords(&mut self, id: &LayerId, coords: &[LonLat]) -> Result<(), SurfaceError>;

    fn set_line_highlight(&mut self, id: &LayerId, highlighted: bool)
    -> Result<(), SurfaceError>;

    fn set_layer_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), SurfaceError>;

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), SurfaceError>;

    /// Places a marker with its entrance transition already running.
    fn place_marker(&mut self, point: &AnnotationPoint) -> Result<MarkerHandle, SurfaceError>;

    fn place_popup(
        &mut self,
        coord: LonLat,
        popup: &Popup,
        offset: PixelOffset,
    ) -> Result<PopupHandle, SurfaceError>;

    /// Starts the exit transition of a marker or popup. The caller removes it
    /// once `duration_ms` has elapsed.
    fn begin_exit(&mut self, visual: VisualHandle, duration_ms: u64);

    fn remove_marker(&mut self, handle: MarkerHandle);

    fn remove_popup(&mut self, handle: PopupHandle);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChartVisibility {
    Visible,
    /// Fading out; still occupies layout.
    FadingOut,
    /// Removed from layout.
    Hidden,
}

pub trait ChartSurface {
    fn set_visibility(&mut self, visibility: ChartVisibility);

    /// Draws one frame of bars.
    fn render(&mut self, layout: &ChartLayout);
}
