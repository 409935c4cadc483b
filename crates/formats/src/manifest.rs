use std::collections::BTreeSet;

use foundation::geo::{Camera, LonLat, PixelOffset};
use serde::{Deserialize, Serialize};

use crate::config::StoryConfig;

pub const MANIFEST_VERSION: &str = "1.0";

/// Declarative description of a whole scroll story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub config: StoryConfig,
    pub chapters: Vec<ChapterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterSpec {
    pub id: String,
    pub camera: CameraSpec,
    #[serde(default)]
    pub legend: String,
    #[serde(default)]
    pub date_range: String,
    /// Allowed to preempt an in-flight transition after the guard window.
    #[serde(default)]
    pub fast_path: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_enter: Vec<LayerToggle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_exit: Vec<LayerToggle>,
    #[serde(default)]
    pub script: ScriptSpec,
}

/// `center` is `[lon, lat]`, as in GeoJSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraSpec {
    pub center: [f64; 2],
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
}

impl CameraSpec {
    pub fn to_camera(&self) -> Camera {
        Camera::new(LonLat::new(self.center[0], self.center[1]), self.zoom)
            .with_pitch(self.pitch)
            .with_bearing(self.bearing)
    }
}

/// Shared (not chapter-owned) map layer shown or hidden on a lifecycle edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerToggle {
    pub layer: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScriptSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathSpec>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PointKind {
    BlinkingPing,
    DetentionMarker,
    VesselMarker,
    TextAnnotation,
    SatellitePopup,
}

impl PointKind {
    /// CSS class the host styles the marker element with.
    pub fn css_class(self) -> &'static str {
        match self {
            PointKind::BlinkingPing => "ping",
            PointKind::DetentionMarker => "detention-marker",
            PointKind::VesselMarker => "vessel-marker",
            PointKind::TextAnnotation => "text-annotation",
            PointKind::SatellitePopup => "satellite-popup",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointSpec {
    pub coord: [f64; 2],
    pub kind: PointKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<PopupSpec>,
    /// Popup anchor when it differs from the marker coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_coord: Option<[f64; 2]>,
    #[serde(default)]
    pub offset: [f64; 2],
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub glow: bool,
    /// Index of the path whose completion starts this point's delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_path: Option<usize>,
}

impl PointSpec {
    pub fn lon_lat(&self) -> LonLat {
        LonLat::new(self.coord[0], self.coord[1])
    }

    pub fn pixel_offset(&self) -> PixelOffset {
        PixelOffset::new(self.offset[0], self.offset[1])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopupSpec {
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathSpec {
    /// Track resource (URL or path) holding the coordinate sequence.
    pub resource: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub pulses: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestError {
    Parse(String),
    UnsupportedVersion(String),
    DuplicateChapter(String),
    Invalid { chapter: String, reason: String },
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Parse(e) => write!(f, "manifest JSON parse error: {e}"),
            ManifestError::UnsupportedVersion(v) => {
                write!(f, "unsupported manifest version {v} (expected {MANIFEST_VERSION})")
            }
            ManifestError::DuplicateChapter(id) => write!(f, "duplicate chapter id: {id}"),
            ManifestError::Invalid { chapter, reason } => {
                write!(f, "invalid chapter {chapter}: {reason}")
            }
        }
    }
}

impl std::error::Error for ManifestError {}

impl StoryManifest {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            title: None,
            config: StoryConfig::default(),
            chapters: Vec::new(),
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ManifestError> {
        let manifest: StoryManifest =
            serde_json::from_str(payload).map_err(|e| ManifestError::Parse(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(self.version.clone()));
        }

        let mut seen = BTreeSet::new();
        for chapter in &self.chapters {
            if !seen.insert(chapter.id.as_str()) {
                return Err(ManifestError::DuplicateChapter(chapter.id.clone()));
            }
            chapter.validate()?;
        }
        Ok(())
    }
}

impl Default for StoryManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl ChapterSpec {
    fn validate(&self) -> Result<(), ManifestError> {
        let invalid = |reason: String| ManifestError::Invalid {
            chapter: self.id.clone(),
            reason,
        };

        if self.id.is_empty() {
            return Err(invalid("empty chapter id".to_string()));
        }
        if !self.camera.to_camera().center.is_valid() {
            return Err(invalid("camera center out of range".to_string()));
        }

        let path_count = self.script.paths.len();
        for (index, point) in self.script.points.iter().enumerate() {
            if !point.lon_lat().is_valid() {
                return Err(invalid(format!("point {index} coordinate out of range")));
            }
            if let Some(path) = point.after_path
                && path >= path_count
            {
                return Err(invalid(format!(
                    "point {index} waits on path {path} but only {path_count} paths exist"
                )));
            }
        }
        for (index, path) in self.script.paths.iter().enumerate() {
            if path.resource.is_empty() {
                return Err(invalid(format!("path {index} has no resource")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ManifestError, PointKind, StoryManifest};
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
        "version": "1.0",
        "title": "Dark fleet",
        "config": { "marker_settle_ms": 250 },
        "chapters": [
            { "id": "intro", "camera": { "center": [54.0, 25.0], "zoom": 4 }, "fast_path": true },
            {
                "id": "chapter1",
                "camera": { "center": [56.3, 26.6], "zoom": 8, "pitch": 40, "bearing": -15 },
                "legend": "AIS gaps",
                "date_range": "Jan 2023 - Mar 2023",
                "on_enter": [{ "layer": "detections", "visible": true }],
                "on_exit": [{ "layer": "detections", "visible": false }],
                "script": {
                    "points": [
                        { "coord": [56.1, 26.5], "kind": "blinking-ping", "delay_ms": 500 },
                        {
                            "coord": [56.4, 26.2],
                            "kind": "satellite-popup",
                            "popup": { "html": "<b>Vessel A</b>", "image": "img/a.jpg" },
                            "offset": [0, -20],
                            "after_path": 0
                        }
                    ],
                    "paths": [{ "resource": "tracks/c1.geojson", "duration_ms": 3000, "pulses": 3 }]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_full_manifest() {
        let m = StoryManifest::from_json_str(MANIFEST).expect("parse");
        assert_eq!(m.chapters.len(), 2);
        assert_eq!(m.config.marker_settle_ms, 250);
        assert!(m.chapters[0].fast_path);

        let c1 = &m.chapters[1];
        assert_eq!(c1.camera.to_camera().pitch, 40.0);
        assert_eq!(c1.script.points[0].kind, PointKind::BlinkingPing);
        assert_eq!(c1.script.points[1].after_path, Some(0));
        assert_eq!(c1.script.points[1].pixel_offset().y, -20.0);
        assert_eq!(c1.script.paths[0].pulses, 3);
    }

    #[test]
    fn rejects_duplicate_chapters() {
        let payload = r#"{ "version": "1.0", "chapters": [
            { "id": "a", "camera": { "center": [0, 0], "zoom": 1 } },
            { "id": "a", "camera": { "center": [0, 0], "zoom": 1 } }
        ] }"#;
        let err = StoryManifest::from_json_str(payload).unwrap_err();
        assert_eq!(err, ManifestError::DuplicateChapter("a".to_string()));
    }

    #[test]
    fn rejects_dangling_path_reference() {
        let payload = r#"{ "version": "1.0", "chapters": [
            { "id": "a", "camera": { "center": [0, 0], "zoom": 1 },
              "script": { "points": [{ "coord": [0, 0], "kind": "vessel-marker", "after_path": 2 }] } }
        ] }"#;
        let err = StoryManifest::from_json_str(payload).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { ref chapter, .. } if chapter == "a"));
    }

    #[test]
    fn rejects_unknown_version() {
        let payload = r#"{ "version": "9", "chapters": [] }"#;
        assert!(matches!(
            StoryManifest::from_json_str(payload),
            Err(ManifestError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn round_trips_through_json() {
        let m = StoryManifest::from_json_str(MANIFEST).expect("parse");
        let json = serde_json::to_string(&m).expect("serialize");
        let again = StoryManifest::from_json_str(&json).expect("reparse");
        assert_eq!(m, again);
    }
}
