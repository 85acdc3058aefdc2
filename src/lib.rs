//! Aerial imagery overlay: fetches slippy-map tiles around a GPS reference
//! fix, stitches them into one texture and keeps it aligned with the vehicle.

pub mod components;
pub mod plugins;
pub mod resources;
pub mod systems;
pub mod tile_system;
pub mod utils;
