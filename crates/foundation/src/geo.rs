/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Map viewport: where the camera looks and how.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub center: LonLat,
    pub zoom: f64,
    /// Degrees from nadir.
    pub pitch: f64,
    /// Degrees clockwise from north.
    pub bearing: f64,
}

impl Camera {
    pub const fn new(center: LonLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    pub const fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub const fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }
}

/// Screen-space offset in CSS pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PixelOffset {
    pub x: f64,
    pub y: f64,
}

impl PixelOffset {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::{Camera, LonLat};

    #[test]
    fn validates_ranges() {
        assert!(LonLat::new(56.3, 26.6).is_valid());
        assert!(!LonLat::new(190.0, 0.0).is_valid());
        assert!(!LonLat::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn camera_builders() {
        let cam = Camera::new(LonLat::new(1.0, 2.0), 5.0)
            .with_pitch(45.0)
            .with_bearing(-20.0);
        assert_eq!(cam.pitch, 45.0);
        assert_eq!(cam.bearing, -20.0);
        assert_eq!(cam.zoom, 5.0);
    }
}
