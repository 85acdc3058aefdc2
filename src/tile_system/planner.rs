use bevy::prelude::*;

use crate::resources::constants::{max_tile_index, tile_count, MAX_COMPOSITE_EDGE, MAX_SESSION_TILES};
use crate::tile_system::projection::{lat_lon_to_tile_coords, meters_per_pixel};
use crate::tile_system::types::{AerialMapError, LatLon, TileGrid, TileId, TileSlot};

/// Requested ground extent of the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Meters east-west
    pub width: f64,
    /// Meters north-south
    pub height: f64,
    /// Meters per output pixel
    pub resolution: f64,
}

impl Footprint {
    fn validate(&self) -> Result<(), AerialMapError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) && valid(self.resolution) {
            Ok(())
        } else {
            Err(AerialMapError::InvalidFootprint {
                width: self.width,
                height: self.height,
                resolution: self.resolution,
            })
        }
    }

    /// Composite size in output pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |meters: f64| ((meters / self.resolution).round() as u32).max(1);
        (px(self.width), px(self.height))
    }
}

/// Plan the tiles covering `footprint` centered on `reference`.
///
/// Slots come out row-major (north to south, west to east). Columns past the
/// antimeridian wrap around, rows past the poles are clamped to the edge row,
/// so every slot keeps its place in the mosaic.
///
/// Plans whose composite or mosaic edge exceeds `MAX_COMPOSITE_EDGE`, or that
/// need more than `MAX_SESSION_TILES` tiles, are rejected.
pub fn plan_grid(
    reference: LatLon,
    footprint: Footprint,
    zoom: u8,
    tile_size: u32,
) -> Result<TileGrid, AerialMapError> {
    footprint.validate()?;
    if tile_size == 0 {
        return Err(AerialMapError::InvalidTileSize);
    }
    let (fx, fy) = lat_lon_to_tile_coords(reference, zoom)?;
    let (width, height) = footprint.pixel_size();

    let native = meters_per_pixel(reference.latitude, zoom, tile_size);
    let mosaic_width = ((footprint.width / native).ceil() as u32).max(1);
    let mosaic_height = ((footprint.height / native).ceil() as u32).max(1);

    let ts = tile_size as i64;
    let n = tile_count(zoom) as i64;

    // Footprint top-left in global pixel space
    let left = (fx * tile_size as f64 - mosaic_width as f64 / 2.0).floor() as i64;
    let top = (fy * tile_size as f64 - mosaic_height as f64 / 2.0).floor() as i64;

    let x_range = left.div_euclid(ts)..=(left + mosaic_width as i64 - 1).div_euclid(ts);
    let y_range = top.div_euclid(ts)..=(top + mosaic_height as i64 - 1).div_euclid(ts);

    let span = |range: &std::ops::RangeInclusive<i64>| (range.end() - range.start() + 1) as u64;
    let tiles = span(&x_range) * span(&y_range);
    let too_wide = [width, height, mosaic_width, mosaic_height]
        .iter()
        .any(|&edge| edge > MAX_COMPOSITE_EDGE);
    if too_wide || tiles > MAX_SESSION_TILES {
        return Err(AerialMapError::FootprintTooLarge { tiles, width, height });
    }

    let mut slots = Vec::with_capacity(tiles as usize);
    for ty in y_range {
        for tx in x_range.clone() {
            let tile = TileId::new(tx.rem_euclid(n) as u32, ty.clamp(0, max_tile_index(zoom) as i64) as u32, zoom);
            let pixel_offset = IVec2::new((tx * ts - left) as i32, (ty * ts - top) as i32);
            slots.push(TileSlot::pending(tile, pixel_offset));
        }
    }

    Ok(TileGrid {
        slots,
        width,
        height,
        mosaic_width,
        mosaic_height,
        ground_width: footprint.width,
        ground_height: footprint.height,
        zoom,
        tile_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAN_FRANCISCO: LatLon = LatLon {
        latitude: 37.7749,
        longitude: -122.4194,
    };

    fn footprint(meters: f64, resolution: f64) -> Footprint {
        Footprint {
            width: meters,
            height: meters,
            resolution,
        }
    }

    #[test]
    fn identical_inputs_give_identical_plans() {
        let a = plan_grid(SAN_FRANCISCO, footprint(500.0, 0.5), 17, 256).unwrap();
        let b = plan_grid(SAN_FRANCISCO, footprint(500.0, 0.5), 17, 256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn grid_covers_the_mosaic() {
        let grid = plan_grid(SAN_FRANCISCO, footprint(100.0, 1.0), 18, 256).unwrap();
        assert_eq!((grid.width, grid.height), (100, 100));
        // ~0.472 m/px natively at zoom 18
        assert_eq!((grid.mosaic_width, grid.mosaic_height), (212, 212));
        assert!(!grid.slots.is_empty());

        let first = grid.slots.first().unwrap().pixel_offset;
        let last = grid.slots.last().unwrap().pixel_offset;
        assert!(first.x <= 0 && first.y <= 0);
        assert!(last.x + 256 >= grid.mosaic_width as i32);
        assert!(last.y + 256 >= grid.mosaic_height as i32);
        for slot in &grid.slots {
            assert!(slot.state.is_pending());
            assert!(slot.pixel_offset.x > -256 && slot.pixel_offset.x < grid.mosaic_width as i32);
            assert!(slot.pixel_offset.y > -256 && slot.pixel_offset.y < grid.mosaic_height as i32);
        }
    }

    #[test]
    fn slots_are_row_major() {
        let grid = plan_grid(SAN_FRANCISCO, footprint(2000.0, 2.0), 17, 256).unwrap();
        let columns = grid
            .slots
            .iter()
            .take_while(|s| s.pixel_offset.y == grid.slots[0].pixel_offset.y)
            .count();
        assert!(columns > 1);
        assert_eq!(grid.slots.len() % columns, 0);
        for (i, slot) in grid.slots.iter().enumerate() {
            let origin = grid.slots[0].pixel_offset;
            let expected = origin + IVec2::new((i % columns) as i32 * 256, (i / columns) as i32 * 256);
            assert_eq!(slot.pixel_offset, expected);
        }
    }

    #[test]
    fn columns_wrap_at_antimeridian() {
        let reference = LatLon::new(0.0, 179.99);
        let grid = plan_grid(reference, footprint(200_000.0, 500.0), 4, 256).unwrap();
        let xs: Vec<u32> = grid.slots.iter().map(|s| s.tile.x).collect();
        assert!(xs.contains(&15));
        assert!(xs.contains(&0));
        assert!(xs.iter().all(|&x| x < 16));
    }

    #[test]
    fn rows_clamp_at_pole() {
        let reference = LatLon::new(85.0, 0.0);
        let grid = plan_grid(reference, footprint(2_000_000.0, 5000.0), 2, 256).unwrap();
        assert!(grid.slots.iter().all(|s| s.tile.y < 4));
        // The row above the pole is kept, pointing at the edge row
        let top_row: Vec<&TileSlot> = grid
            .slots
            .iter()
            .filter(|s| s.pixel_offset.y == grid.slots[0].pixel_offset.y)
            .collect();
        assert!(top_row.iter().all(|s| s.tile.y == 0));
        assert!(grid.slots.len() > top_row.len());
    }

    #[test]
    fn rejects_degenerate_footprint() {
        let err = plan_grid(SAN_FRANCISCO, footprint(0.0, 1.0), 18, 256).unwrap_err();
        assert!(matches!(err, AerialMapError::InvalidFootprint { .. }));
        let err = plan_grid(SAN_FRANCISCO, footprint(100.0, f64::NAN), 18, 256).unwrap_err();
        assert!(matches!(err, AerialMapError::InvalidFootprint { .. }));
    }

    #[test]
    fn rejects_zero_tile_size() {
        let err = plan_grid(SAN_FRANCISCO, footprint(100.0, 1.0), 18, 0).unwrap_err();
        assert_eq!(err, AerialMapError::InvalidTileSize);
    }

    #[test]
    fn rejects_oversized_composite() {
        // 40000 px on a side
        let err = plan_grid(SAN_FRANCISCO, footprint(200.0, 0.005), 19, 256).unwrap_err();
        assert!(matches!(
            err,
            AerialMapError::FootprintTooLarge { width: 40_000, height: 40_000, .. }
        ));
    }

    #[test]
    fn rejects_too_many_tiles() {
        let err = plan_grid(SAN_FRANCISCO, footprint(200_000.0, 0.5), 19, 256).unwrap_err();
        assert!(matches!(err, AerialMapError::FootprintTooLarge { .. }));

        // Small tiles blow up the count long before the edge limit
        let err = plan_grid(SAN_FRANCISCO, footprint(2000.0, 1.0), 22, 8).unwrap_err();
        let AerialMapError::FootprintTooLarge { tiles, .. } = err else {
            panic!("unexpected {err:?}");
        };
        assert!(tiles > MAX_SESSION_TILES);
    }

    #[test]
    fn grid_carries_ground_extent() {
        let grid = plan_grid(SAN_FRANCISCO, footprint(100.0, 1.0), 18, 256).unwrap();
        assert_eq!((grid.ground_width, grid.ground_height), (100.0, 100.0));
    }

    #[test]
    fn rejects_reference_outside_projection() {
        let err = plan_grid(LatLon::new(89.0, 0.0), footprint(100.0, 1.0), 18, 256).unwrap_err();
        assert!(matches!(err, AerialMapError::Projection { .. }));
    }
}
