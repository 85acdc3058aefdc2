use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;
use crate::systems::ui::{setup_ui, update_status_text};

/// Plugin for the status line
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app
            .add_systems(Startup, setup_ui)
            // Status text at 4 Hz (250ms)
            .add_systems(Update, update_status_text.run_if(on_timer(std::time::Duration::from_millis(250))));
    }
}
