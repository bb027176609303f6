//! Map view bounds in WGS84 degrees.

use serde::{Deserialize, Serialize};

/// Web Mercator ground resolution at zoom 0 for 256px tiles, in degrees of longitude per pixel.
const DEGREES_PER_PIXEL_Z0: f64 = 360.0 / 256.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The visible map extent, expressed by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Build from the south-west and north-east corners.
    pub fn from_corners(south_west: LatLng, north_east: LatLng) -> Self {
        Self::new(south_west.lng, south_west.lat, north_east.lng, north_east.lat)
    }

    /// Parse a "west,south,east,north" string.
    pub fn from_edge_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |part: &str| -> Result<f64, BboxParseError> {
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| BboxParseError::InvalidNumber(part.to_string()))
        };

        Ok(Self {
            west: parse(parts[0])?,
            south: parse(parts[1])?,
            east: parse(parts[2])?,
            north: parse(parts[3])?,
        })
    }

    /// Bounds of a `width` x `height` pixel viewport centred on `center` at `zoom`.
    ///
    /// Longitude scales linearly with pixels; latitude is derived through the
    /// Web Mercator y axis so that high-latitude views are not squashed.
    pub fn around(center: LatLng, zoom: u8, width_px: u32, height_px: u32) -> Self {
        let degrees_per_pixel = DEGREES_PER_PIXEL_Z0 / 2f64.powi(i32::from(zoom));
        let half_width = f64::from(width_px) / 2.0 * degrees_per_pixel;

        // Mercator y in "degrees" so it shares the pixel scale with longitude.
        let to_merc = |lat: f64| {
            let lat = lat.clamp(-85.051_128_78, 85.051_128_78).to_radians();
            (lat.tan() + 1.0 / lat.cos()).ln().to_degrees()
        };
        let from_merc = |y: f64| y.to_radians().sinh().atan().to_degrees();

        let center_y = to_merc(center.lat);
        let half_height = f64::from(height_px) / 2.0 * degrees_per_pixel;

        Self {
            west: center.lng - half_width,
            south: from_merc(center_y - half_height),
            east: center.lng + half_width,
            north: from_merc(center_y + half_height),
        }
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south
    }

    /// Check if a point is contained within this bbox.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lng >= self.west
            && point.lng <= self.east
            && point.lat >= self.south
            && point.lat <= self.north
    }

    /// Stable key fragment (quantized to 6 decimal places).
    pub fn cache_key(&self) -> String {
        format!(
            "{:.6}_{:.6}_{:.6}_{:.6}",
            self.west, self.south, self.east, self.north
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounds format: {0}. Expected 'west,south,east,north'")]
    InvalidFormat(String),

    #[error("Invalid number in bounds: {0}")]
    InvalidNumber(String),
}
