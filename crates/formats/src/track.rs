use foundation::geo::LonLat;
use serde_json::Value;

/// Ordered coordinate sequence for a vessel track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub coords: Vec<LonLat>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    Json(String),
    UnsupportedGeometry(String),
    InvalidCoordinate { index: usize },
    Empty,
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::Json(e) => write!(f, "track JSON parse error: {e}"),
            TrackError::UnsupportedGeometry(ty) => write!(f, "unsupported track geometry: {ty}"),
            TrackError::InvalidCoordinate { index } => {
                write!(f, "invalid coordinate at position {index}")
            }
            TrackError::Empty => write!(f, "track has no coordinates"),
        }
    }
}

impl std::error::Error for TrackError {}

impl Track {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Parses a GeoJSON document into one track.
    ///
    /// Accepts a FeatureCollection, a single Feature, or a bare geometry.
    /// Line geometries contribute their vertices in order, point geometries
    /// contribute themselves; everything is concatenated in document order.
    pub fn from_geojson_str(payload: &str) -> Result<Self, TrackError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| TrackError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, TrackError> {
        let mut coords = Vec::new();
        collect_document(value, &mut coords)?;
        if coords.is_empty() {
            return Err(TrackError::Empty);
        }
        Ok(Self { coords })
    }
}

fn collect_document(value: &Value, out: &mut Vec<LonLat>) -> Result<(), TrackError> {
    let ty = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TrackError::UnsupportedGeometry("missing type".to_string()))?;

    match ty {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(|v| v.as_array())
                .ok_or_else(|| TrackError::Json("FeatureCollection without features".to_string()))?;
            for feature in features {
                collect_document(feature, out)?;
            }
            Ok(())
        }
        // Features without geometry carry nothing drawable.
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => Ok(()),
            Some(geometry) => collect_geometry(geometry, out),
        },
        _ => collect_geometry(value, out),
    }
}

fn collect_geometry(geometry: &Value, out: &mut Vec<LonLat>) -> Result<(), TrackError> {
    let ty = geometry
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let coordinates = geometry.get("coordinates");

    match (ty, coordinates) {
        ("Point", Some(c)) => push_position(c, out),
        ("MultiPoint" | "LineString", Some(Value::Array(positions))) => {
            for p in positions {
                push_position(p, out)?;
            }
            Ok(())
        }
        ("MultiLineString", Some(Value::Array(lines))) => {
            for line in lines {
                let positions = line
                    .as_array()
                    .ok_or(TrackError::InvalidCoordinate { index: out.len() })?;
                for p in positions {
                    push_position(p, out)?;
                }
            }
            Ok(())
        }
        ("GeometryCollection", _) => {
            let geometries = geometry
                .get("geometries")
                .and_then(|v| v.as_array())
                .ok_or_else(|| TrackError::UnsupportedGeometry(ty.to_string()))?;
            for g in geometries {
                collect_geometry(g, out)?;
            }
            Ok(())
        }
        _ => Err(TrackError::UnsupportedGeometry(ty.to_string())),
    }
}

fn push_position(position: &Value, out: &mut Vec<LonLat>) -> Result<(), TrackError> {
    let index = out.len();
    let arr = position
        .as_array()
        .ok_or(TrackError::InvalidCoordinate { index })?;
    let (Some(lon), Some(lat)) = (
        arr.first().and_then(|v| v.as_f64()),
        arr.get(1).and_then(|v| v.as_f64()),
    ) else {
        return Err(TrackError::InvalidCoordinate { index });
    };

    let p = LonLat::new(lon, lat);
    if !p.is_valid() {
        return Err(TrackError::InvalidCoordinate { index });
    }
    out.push(p);
    Ok(())
}
