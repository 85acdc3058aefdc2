use std::sync::Arc;

use anyhow::Context;
use bevy::prelude::*;
use tokio::runtime::Runtime;

use crate::components::AerialMapQuad;
use crate::debug_log;
use crate::resources::{AerialMapDisplay, AerialMapSettings, DebugSettings, TileServerSettings, TokioRuntime};
use crate::systems::aerial_map::apply_material;
use crate::tile_system::rendering::create_map_quad_mesh;
use crate::tile_system::{AerialMapEngine, FetchCoordinator, HttpTileFetcher};

/// Build the tokio runtime and the display core that fetches on it
pub fn init_resources(server: &TileServerSettings) -> anyhow::Result<(TokioRuntime, AerialMapDisplay)> {
    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    let fetcher = HttpTileFetcher::new(server.url_template.clone())?;
    let coordinator = FetchCoordinator::new(Arc::new(fetcher), runtime.handle().clone())
        .with_request_timeout(server.request_timeout);

    info!("Fetching aerial tiles from {}", server.url_template);
    Ok((TokioRuntime(runtime), AerialMapDisplay(AerialMapEngine::new(coordinator))))
}

/// Setup the scene with a camera above the fix, lighting, and the map quad
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<AerialMapSettings>,
    debug_settings: Res<DebugSettings>,
) {
    // The vehicle is always at the world origin; look straight down on it
    // from high enough to see the whole footprint
    let height = settings.width.max(settings.height) as f32;
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: std::f32::consts::PI / 2.0, // 90 degrees FOV
            near: 0.1,
            far: 100_000.0,
            ..default()
        }),
        Transform::from_xyz(0.0, height, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 0.5,
    });

    // Vehicle marker
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(1.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.2, 0.1),
            unlit: true,
            ..default()
        })),
        Transform::default(),
    ));

    let mut material = StandardMaterial {
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    };
    apply_material(&mut material, settings.alpha, settings.draw_under);

    // Hidden until the first composite arrives
    commands.spawn((
        Mesh3d(meshes.add(create_map_quad_mesh())),
        MeshMaterial3d(materials.add(material)),
        Transform::default(),
        Visibility::Hidden,
        AerialMapQuad::default(),
    ));

    debug_log!(
        debug_settings,
        "Aerial map: {}x{} m at {} m/px, topic {}",
        settings.width,
        settings.height,
        settings.resolution,
        settings.topic
    );
}
