mod map;

pub use map::*;

use bevy::prelude::*;

/// Marker component for the UI text that displays the display status
#[derive(Component)]
pub struct StatusText;
