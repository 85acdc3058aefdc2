use bevy::prelude::*;
use std::fmt;
use thiserror::Error;

/// Represents a unique tile ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    /// X coordinate
    pub x: u32,
    /// Y coordinate
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileId {
    /// Create a new tile ID
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic coordinate in degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Inbound GPS message. Only the two coordinate fields are consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavSatFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<NavSatFix> for LatLon {
    fn from(msg: NavSatFix) -> Self {
        LatLon::new(msg.latitude, msg.longitude)
    }
}

/// Planar displacement from the reference fix, in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub east: f64,
    pub north: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { east: 0.0, north: 0.0 };
}

/// Outcome of a single tile fetch
#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    Pending,
    Loaded(Vec<u8>),
    Failed(TileError),
}

impl TileState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TileState::Pending)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, TileState::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TileState::Failed(_))
    }
}

/// One cell of a planned grid
#[derive(Debug, Clone, PartialEq)]
pub struct TileSlot {
    pub tile: TileId,
    /// Signed distance in tile pixels from the footprint's top-left corner
    /// to the tile's top-left corner.
    pub pixel_offset: IVec2,
    pub state: TileState,
}

impl TileSlot {
    pub fn pending(tile: TileId, pixel_offset: IVec2) -> Self {
        Self {
            tile,
            pixel_offset,
            state: TileState::Pending,
        }
    }
}

/// The planned tile set covering one footprint
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    /// Row-major, north to south then west to east
    pub slots: Vec<TileSlot>,
    /// Composite size in output pixels
    pub width: u32,
    pub height: u32,
    /// Footprint size in native tile pixels
    pub mosaic_width: u32,
    pub mosaic_height: u32,
    /// Ground extent in meters
    pub ground_width: f64,
    pub ground_height: f64,
    pub zoom: u8,
    pub tile_size: u32,
}

/// Error type for a single tile; never fatal to a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered with HTTP {0}")]
    HttpStatus(u16),
    #[error("empty payload")]
    EmptyPayload,
    #[error("undecodable image: {0}")]
    Decode(String),
    #[error("tile is {width}x{height}, expected {expected}x{expected}")]
    SizeMismatch { width: u32, height: u32, expected: u32 },
    #[error("request timed out")]
    Timeout,
}

/// Errors surfaced by the aerial map core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AerialMapError {
    #[error("coordinate ({latitude}, {longitude}) is outside the Web Mercator domain")]
    Projection { latitude: f64, longitude: f64 },
    #[error("invalid footprint: {width}m x {height}m at {resolution} m/px")]
    InvalidFootprint {
        width: f64,
        height: f64,
        resolution: f64,
    },
    #[error("zoom level {0} is not supported")]
    InvalidZoom(u8),
    #[error("tile size must be positive")]
    InvalidTileSize,
    #[error("footprint too large: {tiles} tiles, {width}x{height} px")]
    FootprintTooLarge { tiles: u64, width: u32, height: u32 },
}

/// Placement of the composite quad in the local frame (x east, y north, z up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapTransform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for MapTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}
