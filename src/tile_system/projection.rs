//! Web Mercator tile math.
//!
//! Tile coordinates follow the slippy-map convention: (0,0) at the northwest
//! corner, x increasing eastward, y increasing southward. All functions are
//! pure so that re-planning the same footprint is bit-for-bit repeatable.

use std::f64::consts::PI;

use crate::resources::constants::{
    tile_count, EARTH_RADIUS, MAX_AUTO_ZOOM_LEVEL, MAX_LATITUDE, MAX_ZOOM_LEVEL,
};
use crate::tile_system::types::{AerialMapError, LatLon, Offset};

/// Reject coordinates the projection is undefined for
pub fn validate(coord: LatLon) -> Result<LatLon, AerialMapError> {
    let LatLon { latitude, longitude } = coord;
    if !latitude.is_finite() || !longitude.is_finite() || latitude.abs() >= MAX_LATITUDE {
        return Err(AerialMapError::Projection { latitude, longitude });
    }
    Ok(coord)
}

/// Convert a coordinate to fractional tile coordinates at `zoom`.
///
/// Callers floor the result to get the tile index; the fractional part is the
/// position inside that tile. Longitudes outside [-180, 180) produce x outside
/// [0, 2^zoom) and are wrapped by the planner.
pub fn lat_lon_to_tile_coords(coord: LatLon, zoom: u8) -> Result<(f64, f64), AerialMapError> {
    let coord = validate(coord)?;
    if zoom > MAX_ZOOM_LEVEL {
        return Err(AerialMapError::InvalidZoom(zoom));
    }

    let n = tile_count(zoom) as f64;
    let lat_rad = coord.latitude.to_radians();

    let x = (coord.longitude + 180.0) / 360.0 * n;
    // Inverse Gudermannian: ln(tan(lat) + sec(lat))
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    Ok((x, y))
}

/// Inverse of [`lat_lon_to_tile_coords`]
pub fn tile_coords_to_lat_lon(x: f64, y: f64, zoom: u8) -> LatLon {
    let n = tile_count(zoom) as f64;
    let longitude = x / n * 360.0 - 180.0;
    let latitude = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    LatLon::new(latitude, longitude)
}

/// Native ground resolution of a tile pixel at `latitude`
pub fn meters_per_pixel(latitude: f64, zoom: u8, tile_size: u32) -> f64 {
    let circumference = 2.0 * PI * EARTH_RADIUS * latitude.to_radians().cos();
    circumference / (tile_size as f64 * tile_count(zoom) as f64)
}

/// Pick the coarsest zoom whose native pixels are at least as fine as
/// `resolution`, so the composite is never upsampled from blurrier tiles.
pub fn zoom_for_resolution(latitude: f64, resolution: f64, tile_size: u32) -> u8 {
    (0..=MAX_AUTO_ZOOM_LEVEL)
        .find(|&zoom| meters_per_pixel(latitude, zoom, tile_size) <= resolution)
        .unwrap_or(MAX_AUTO_ZOOM_LEVEL)
}

/// East/north displacement of `fix` from `reference`.
///
/// Uses the local derivative of the projection at the reference latitude, so
/// it is accurate over the few kilometers an overlay spans.
pub fn local_offset(reference: LatLon, fix: LatLon) -> Result<Offset, AerialMapError> {
    let (x_ref, y_ref) = lat_lon_to_tile_coords(reference, 0)?;
    let (x, y) = lat_lon_to_tile_coords(fix, 0)?;

    // Shortest way around the antimeridian
    let mut dx = x - x_ref;
    dx -= dx.round();
    let dy = y - y_ref;

    let meters_per_unit = 2.0 * PI * EARTH_RADIUS * reference.latitude.to_radians().cos();
    Ok(Offset {
        east: dx * meters_per_unit,
        north: -dy * meters_per_unit,
    })
}
