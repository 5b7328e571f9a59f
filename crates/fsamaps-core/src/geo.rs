//! Map geometry: coordinates, bounding boxes, and the view reported by the map.

use serde::{Deserialize, Serialize};

/// Highest zoom level served by the tile layer.
pub const MAX_ZOOM: u8 = 19;

const TILE_SIZE_PX: f64 = 256.0;
const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// South/north latitude and west/east longitude bounds, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        Self {
            south,
            north,
            west,
            east,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        LatLng::new(self.south, self.west).is_valid()
            && LatLng::new(self.north, self.east).is_valid()
            && self.south <= self.north
    }

    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        let in_lat = (self.south..=self.north).contains(&point.lat);
        let in_lng = if self.west <= self.east {
            (self.west..=self.east).contains(&point.lng)
        } else {
            // crosses the antimeridian
            point.lng >= self.west || point.lng <= self.east
        };
        in_lat && in_lng
    }

    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for PixelSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// What the map widget reports after every pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub bounds: BoundingBox,
    pub zoom: u8,
}

impl MapView {
    #[must_use]
    pub const fn new(bounds: BoundingBox, zoom: u8) -> Self {
        Self { bounds, zoom }
    }

    /// The view of a `size`-pixel viewport centred on `center` at `zoom`,
    /// using Web Mercator tile math.
    ///
    /// Latitudes are clamped to the Mercator limit and longitudes to
    /// `[-180, 180]`, so the result is always a valid box.
    #[must_use]
    pub fn around(center: LatLng, zoom: u8, size: PixelSize) -> Self {
        let zoom = zoom.min(MAX_ZOOM);
        let world_px = TILE_SIZE_PX * f64::from(1u32 << zoom);
        let (x, y) = project(center, world_px);
        let half_w = f64::from(size.width) / 2.0;
        let half_h = f64::from(size.height) / 2.0;

        let north_west = unproject(x - half_w, y - half_h, world_px);
        let south_east = unproject(x + half_w, y + half_h, world_px);

        Self {
            bounds: BoundingBox::new(
                south_east.lat,
                north_west.lat,
                north_west.lng,
                south_east.lng,
            ),
            zoom,
        }
    }
}

fn project(point: LatLng, world_px: f64) -> (f64, f64) {
    let lat = point
        .lat
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    let x = (point.lng + 180.0) / 360.0 * world_px;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * world_px;
    (x, y)
}

fn unproject(x: f64, y: f64, world_px: f64) -> LatLng {
    let x = x.clamp(0.0, world_px);
    let y = y.clamp(0.0, world_px);
    let lng = x / world_px * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / world_px);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}
