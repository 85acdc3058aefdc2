use bevy::log::warn;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::tile_system::types::{TileError, TileGrid, TileState};

/// How much of the grid made it into the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeStatus {
    /// Every tile loaded
    Complete,
    /// Some tiles are blank sentinels
    Partial,
    /// Nothing loaded; the composite is entirely blank
    Empty,
}

/// Stitched imagery for one footprint, ready for texture upload
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeTexture {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major, first row is the northern edge
    pub pixels: Vec<u8>,
    /// Ground extent the texture covers, in meters
    pub ground_width: f32,
    pub ground_height: f32,
    pub loaded: usize,
    pub failed: usize,
    pub status: CompositeStatus,
}

/// Decode one tile, rejecting anything that is not `tile_size` square
fn decode_tile(bytes: &[u8], tile_size: u32) -> Result<RgbaImage, TileError> {
    let tile = image::load_from_memory(bytes)
        .map_err(|err| TileError::Decode(err.to_string()))?
        .to_rgba8();
    if tile.dimensions() != (tile_size, tile_size) {
        return Err(TileError::SizeMismatch {
            width: tile.width(),
            height: tile.height(),
            expected: tile_size,
        });
    }
    Ok(tile)
}

/// Stitch a resolved grid into one texture.
///
/// Tiles are blitted at native resolution into a mosaic the size of the
/// footprint, then the mosaic is resampled to the requested composite size.
/// Failed slots, and loaded slots that do not decode to a tile of the
/// expected size, stay fully transparent.
pub fn assemble(grid: &TileGrid) -> CompositeTexture {
    let mut mosaic = RgbaImage::new(grid.mosaic_width, grid.mosaic_height);
    let mut loaded = 0;
    let mut failed = 0;

    for slot in &grid.slots {
        let TileState::Loaded(bytes) = &slot.state else {
            failed += 1;
            continue;
        };
        match decode_tile(bytes, grid.tile_size) {
            Ok(tile) => {
                imageops::replace(
                    &mut mosaic,
                    &tile,
                    slot.pixel_offset.x as i64,
                    slot.pixel_offset.y as i64,
                );
                loaded += 1;
            }
            Err(err) => {
                warn!("Discarding tile {}: {}", slot.tile, err);
                failed += 1;
            }
        }
    }

    let composite = if mosaic.dimensions() == (grid.width, grid.height) {
        mosaic
    } else {
        imageops::resize(&mosaic, grid.width, grid.height, FilterType::Triangle)
    };

    let status = match (loaded, failed) {
        (_, 0) => CompositeStatus::Complete,
        (0, _) => CompositeStatus::Empty,
        _ => CompositeStatus::Partial,
    };

    CompositeTexture {
        width: composite.width(),
        height: composite.height(),
        pixels: composite.into_raw(),
        ground_width: grid.ground_width as f32,
        ground_height: grid.ground_height as f32,
        loaded,
        failed,
        status,
    }
}
