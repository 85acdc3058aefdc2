use std::time::Duration;

/// Constants for the aerial map tile system
pub const TILE_SIZE: u32 = 256; // Standard slippy-map tile size in pixels
pub const MAX_ZOOM_LEVEL: u8 = 22; // Deepest zoom any tile server we target publishes
pub const MAX_AUTO_ZOOM_LEVEL: u8 = 19; // Deepest zoom picked when deriving zoom from resolution

/// Upper bounds on one imagery session
pub const MAX_SESSION_TILES: u64 = 1024;
pub const MAX_COMPOSITE_EDGE: u32 = 8192; // pixels, composite and mosaic alike

/// Web Mercator is undefined beyond this latitude (degrees)
pub const MAX_LATITUDE: f64 = 85.0511;

/// WGS84 equatorial radius, as used by Web Mercator (meters)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

pub const DEFAULT_TILE_SERVER: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Number of tiles along one axis at a zoom level
pub fn tile_count(zoom: u8) -> u32 {
    1 << zoom
}

// Calculate MAX_TILE_INDEX dynamically based on zoom level
pub fn max_tile_index(zoom: u8) -> u32 {
    tile_count(zoom) - 1 // 2^zoom - 1
}
