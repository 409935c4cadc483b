use foundation::geo::{LonLat, PixelOffset};
use formats::{PathSpec, PointKind, PointSpec, PopupSpec, ScriptSpec};

/// What starts a point's entrance delay.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Counted from the moment the chapter's choreography starts.
    OnEnter,
    /// Counted from the end of path `n` (drawing plus highlight pulses).
    AfterPath(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub html: String,
    pub image: Option<String>,
    pub class: Option<String>,
}

/// A single geo-located visual: a marker and, optionally, its popup.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPoint {
    pub coord: LonLat,
    pub kind: PointKind,
    pub label: Option<String>,
    pub popup: Option<Popup>,
    pub popup_coord: Option<LonLat>,
    pub offset: PixelOffset,
    pub delay_ms: u64,
    pub glow: bool,
    pub trigger: Trigger,
}

impl AnnotationPoint {
    pub fn new(coord: LonLat, kind: PointKind) -> Self {
        Self {
            coord,
            kind,
            label: None,
            popup: None,
            popup_coord: None,
            offset: PixelOffset::default(),
            delay_ms: 0,
            glow: false,
            trigger: Trigger::OnEnter,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_popup(mut self, html: impl Into<String>, image: Option<String>) -> Self {
        self.popup = Some(Popup {
            html: html.into(),
            image,
            class: None,
        });
        self
    }

    pub fn with_offset(mut self, offset: PixelOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn after_path(mut self, path: usize) -> Self {
        self.trigger = Trigger::AfterPath(path);
        self
    }

    pub fn popup_anchor(&self) -> LonLat {
        self.popup_coord.unwrap_or(self.coord)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: "#f5c542".to_string(),
            width: 2.5,
        }
    }
}

/// Progressive reveal of a track fetched from `resource`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathAnimation {
    pub resource: String,
    pub duration_ms: u64,
    pub pulses: u32,
    pub style: LineStyle,
}

impl PathAnimation {
    pub fn new(resource: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            resource: resource.into(),
            duration_ms,
            pulses: 0,
            style: LineStyle::default(),
        }
    }

    pub fn with_pulses(mut self, pulses: u32) -> Self {
        self.pulses = pulses;
        self
    }
}

/// Everything one chapter puts on the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterScript {
    pub points: Vec<AnnotationPoint>,
    pub paths: Vec<PathAnimation>,
}

impl ChapterScript {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.paths.is_empty()
    }
}

impl From<&PopupSpec> for Popup {
    fn from(spec: &PopupSpec) -> Self {
        Self {
            html: spec.html.clone(),
            image: spec.image.clone(),
            class: spec.class.clone(),
        }
    }
}

impl From<&PointSpec> for AnnotationPoint {
    fn from(spec: &PointSpec) -> Self {
        Self {
            coord: spec.lon_lat(),
            kind: spec.kind,
            label: spec.label.clone(),
            popup: spec.popup.as_ref().map(Popup::from),
            popup_coord: spec.popup_coord.map(|c| LonLat::new(c[0], c[1])),
            offset: spec.pixel_offset(),
            delay_ms: spec.delay_ms,
            glow: spec.glow,
            trigger: spec.after_path.map_or(Trigger::OnEnter, Trigger::AfterPath),
        }
    }
}

impl From<&PathSpec> for PathAnimation {
    fn from(spec: &PathSpec) -> Self {
        let default_style = LineStyle::default();
        Self {
            resource: spec.resource.clone(),
            duration_ms: spec.duration_ms,
            pulses: spec.pulses,
            style: LineStyle {
                color: spec.color.clone().unwrap_or(default_style.color),
                width: spec.width.unwrap_or(default_style.width),
            },
        }
    }
}

impl From<&ScriptSpec> for ChapterScript {
    fn from(spec: &ScriptSpec) -> Self {
        Self {
            points: spec.points.iter().map(AnnotationPoint::from).collect(),
            paths: spec.paths.iter().map(PathAnimation::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnotationPoint, ChapterScript, Trigger};
    use foundation::geo::LonLat;
    use formats::{PathSpec, PointKind, PointSpec, ScriptSpec};

    #[test]
    fn converts_specs() {
        let spec = ScriptSpec {
            points: vec![PointSpec {
                coord: [56.0, 26.0],
                kind: PointKind::VesselMarker,
                label: Some("MT Example".to_string()),
                popup: None,
                popup_coord: Some([56.2, 26.1]),
                offset: [4.0, -8.0],
                delay_ms: 250,
                glow: true,
                after_path: Some(0),
            }],
            paths: vec![PathSpec {
                resource: "t.geojson".to_string(),
                duration_ms: 1000,
                pulses: 2,
                color: None,
                width: Some(4.0),
            }],
        };
        let script = ChapterScript::from(&spec);
        let p = &script.points[0];
        assert_eq!(p.trigger, Trigger::AfterPath(0));
        assert_eq!(p.popup_anchor(), LonLat::new(56.2, 26.1));
        assert!(p.glow);
        assert_eq!(script.paths[0].style.width, 4.0);
        assert_eq!(script.paths[0].pulses, 2);
    }

    #[test]
    fn popup_anchor_defaults_to_marker() {
        let p = AnnotationPoint::new(LonLat::new(1.0, 2.0), PointKind::BlinkingPing);
        assert_eq!(p.popup_anchor(), LonLat::new(1.0, 2.0));
    }
}
