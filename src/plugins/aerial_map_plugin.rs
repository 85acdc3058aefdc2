use bevy::prelude::*;
use crate::systems::aerial_map::update_aerial_map;
use crate::systems::controls::handle_display_controls;

/// Drives the display core once per frame
pub struct AerialMapPlugin;

impl Plugin for AerialMapPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (handle_display_controls, update_aerial_map).chain());
    }
}
