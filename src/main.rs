use bevy::prelude::*;

use aerial_map::plugins::AppPlugins;
use aerial_map::resources::TileServerSettings;
use aerial_map::systems::fix_input::spawn_stdin_reader;
use aerial_map::systems::setup::init_resources;

fn main() -> anyhow::Result<()> {
    let mut server = TileServerSettings::default();
    if let Ok(url_template) = std::env::var("AERIAL_MAP_TILE_URL") {
        server.url_template = url_template;
    }

    let (tokio_runtime, display) = init_resources(&server)?;
    spawn_stdin_reader(display.0.fix_sink())?;

    App::new()
        .add_plugins(DefaultPlugins)
        .insert_resource(server)
        .insert_resource(tokio_runtime)
        .insert_resource(display)
        .add_plugins(AppPlugins)
        .run();

    Ok(())
}
