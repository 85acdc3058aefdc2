use bevy::prelude::*;

use crate::tile_system::AerialMapEngine;

/// The display core, driven once per frame by `update_aerial_map`
#[derive(Resource)]
pub struct AerialMapDisplay(pub AerialMapEngine);
