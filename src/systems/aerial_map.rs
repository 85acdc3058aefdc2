use bevy::prelude::*;

use crate::components::AerialMapQuad;
use crate::debug_log;
use crate::resources::{AerialMapDisplay, AerialMapSettings, DebugSettings};
use crate::tile_system::rendering::{create_image_from_composite, map_quad_transform};
use crate::tile_system::{CompositeTexture, DisplayConfig, DisplayHost, MapTransform};
use crate::utils::logging::format_composite;

/// Depth bias that lets every other surface win against the overlay
pub const DRAW_UNDER_DEPTH_BIAS: f32 = -1000.0;

/// Collects what the display publishes during one update so it can be
/// applied to the scene once the update returns
struct SceneHost<'a> {
    settings: &'a AerialMapSettings,
    composite: Option<CompositeTexture>,
    transform: Option<MapTransform>,
    material: Option<(f32, bool)>,
}

impl<'a> SceneHost<'a> {
    fn new(settings: &'a AerialMapSettings) -> Self {
        Self {
            settings,
            composite: None,
            transform: None,
            material: None,
        }
    }
}

impl DisplayHost for SceneHost<'_> {
    fn current_config(&self) -> DisplayConfig {
        self.settings.to_display_config()
    }

    fn on_composite_ready(&mut self, composite: &CompositeTexture) {
        self.composite = Some(composite.clone());
    }

    fn on_transform_ready(&mut self, transform: MapTransform) {
        self.transform = Some(transform);
    }

    fn on_material_changed(&mut self, alpha: f32, draw_under: bool) {
        self.material = Some((alpha, draw_under));
    }
}

/// Set the overlay's opacity and draw order
pub fn apply_material(material: &mut StandardMaterial, alpha: f32, draw_under: bool) {
    material.base_color = Color::srgba(1.0, 1.0, 1.0, alpha.clamp(0.0, 1.0));
    // Blank tiles are transparent, so blending stays on even at full opacity
    material.alpha_mode = AlphaMode::Blend;
    material.depth_bias = if draw_under { DRAW_UNDER_DEPTH_BIAS } else { 0.0 };
}

/// Run the display core for this frame and push its output into the scene
pub fn update_aerial_map(
    mut display: ResMut<AerialMapDisplay>,
    settings: Res<AerialMapSettings>,
    debug_settings: Res<DebugSettings>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut quads: Query<(
        &mut AerialMapQuad,
        &mut Transform,
        &mut Visibility,
        &MeshMaterial3d<StandardMaterial>,
    )>,
) {
    let mut host = SceneHost::new(&settings);
    display.0.update(&mut host);

    let Ok((mut quad, mut transform, mut visibility, material_handle)) = quads.get_single_mut() else {
        return;
    };

    if let Some(placement) = host.transform {
        quad.placement = placement;
    }

    if let Some((alpha, draw_under)) = host.material {
        if let Some(material) = materials.get_mut(&material_handle.0) {
            apply_material(material, alpha, draw_under);
        }
    }

    if let Some(composite) = host.composite.take() {
        debug_log!(debug_settings, "{}", format_composite(&composite));

        quad.extent = Vec2::new(composite.ground_width, composite.ground_height);
        let image = images.add(create_image_from_composite(&composite));
        if let Some(material) = materials.get_mut(&material_handle.0) {
            material.base_color_texture = Some(image);
        }
        *visibility = Visibility::Visible;
    }

    // A reset forgets the reference; the old imagery no longer lines up
    if (!settings.enabled || display.0.reference().is_none()) && *visibility != Visibility::Hidden {
        *visibility = Visibility::Hidden;
    }

    let placed = map_quad_transform(quad.placement, quad.extent.x, quad.extent.y);
    if *transform != placed {
        *transform = placed;
    }
}
