/// Handle to a marker placed on a map surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

/// Handle to a popup placed on a map surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopupHandle(pub u64);

/// Either kind of DOM-backed visual, for code that treats them uniformly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VisualHandle {
    Marker(MarkerHandle),
    Popup(PopupHandle),
}
