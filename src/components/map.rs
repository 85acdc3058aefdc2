use bevy::prelude::*;

use crate::tile_system::MapTransform;

/// The textured quad the composite is drawn on
#[derive(Component, Default)]
pub struct AerialMapQuad {
    // Last placement published by the display, in the local ENU frame
    pub placement: MapTransform,
    // Ground extent of the texture currently shown (meters)
    pub extent: Vec2,
}
