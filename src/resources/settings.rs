use std::time::Duration;

use bevy::prelude::*;

use crate::resources::constants::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_TILE_SERVER, TILE_SIZE};
use crate::tile_system::DisplayConfig;

/// User-editable display parameters. Read by the update loop every frame.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct AerialMapSettings {
    // Meters per composite pixel
    pub resolution: f32,
    // Ground extent in meters
    pub width: u32,
    pub height: u32,
    pub alpha: f32,
    pub draw_under: bool,
    // None derives the zoom from the resolution
    pub zoom: Option<u8>,
    pub tile_size: u32,
    pub topic: String,
    pub enabled: bool,
    pub fixed_frame: String,
}

impl Default for AerialMapSettings {
    fn default() -> Self {
        Self {
            resolution: 0.5,
            width: 200,
            height: 200,
            alpha: 0.8,
            draw_under: false,
            zoom: None,
            tile_size: TILE_SIZE,
            topic: "stdin".to_string(),
            enabled: true,
            fixed_frame: "map".to_string(),
        }
    }
}

impl AerialMapSettings {
    pub fn to_display_config(&self) -> DisplayConfig {
        DisplayConfig {
            resolution: self.resolution,
            width: self.width,
            height: self.height,
            alpha: self.alpha,
            draw_under: self.draw_under,
            zoom: self.zoom,
            tile_size: self.tile_size,
            topic: self.topic.clone(),
            enabled: self.enabled,
            fixed_frame: self.fixed_frame.clone(),
        }
    }
}

/// Where tiles come from. Only read when the display is created.
#[derive(Resource, Debug, Clone)]
pub struct TileServerSettings {
    // Template with {z}, {x} and {y} placeholders
    pub url_template: String,
    pub request_timeout: Duration,
}

impl Default for TileServerSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_SERVER.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Resource, Default)]
pub struct DebugSettings {
    pub debug_mode: bool,
}
