mod aerial_map_plugin;
mod core_plugin;
mod ui_plugin;

use bevy::prelude::*;
use bevy::app::PluginGroupBuilder;
pub use aerial_map_plugin::AerialMapPlugin;
pub use core_plugin::CorePlugin;
pub use ui_plugin::UiPlugin;

/// Consolidated plugin struct that groups all application plugins
pub struct AppPlugins;

impl PluginGroup for AppPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(CorePlugin)
            .add(AerialMapPlugin)
            .add(UiPlugin)
    }
}
