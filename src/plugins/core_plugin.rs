use bevy::prelude::*;
use crate::systems::setup::setup;
use crate::resources::{AerialMapSettings, DebugSettings};

/// Core plugin that handles the basic app setup.
///
/// Expects `TokioRuntime` and `AerialMapDisplay` to be inserted already;
/// see `systems::setup::init_resources`.
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<AerialMapSettings>()
            .init_resource::<DebugSettings>()
            .add_systems(Startup, setup);
    }
}
