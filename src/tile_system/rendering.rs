use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::tile_system::compositor::CompositeTexture;
use crate::tile_system::types::MapTransform;
use crate::utils::coordinate_conversion::{enu_rotation_to_world, enu_to_world};

/// Create a texture from a composite
pub fn create_image_from_composite(composite: &CompositeTexture) -> Image {
    let size = Extent3d {
        width: composite.width,
        height: composite.height,
        depth_or_array_layers: 1,
    };

    Image::new(
        size,
        TextureDimension::D2,
        composite.pixels.clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    )
}

/// Unit quad in the XZ plane (Y up), UV (0,0) at the northwest corner.
///
/// North is -Z, matching [`enu_to_world`].
pub fn create_map_quad_mesh() -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());

    let vertices: [[f32; 8]; 4] = [
        // positions (XYZ)      normals (XYZ)    UV coords
        [-0.5, 0.0, -0.5,    0.0, 1.0, 0.0,    0.0, 0.0], // northwest corner
        [0.5, 0.0, -0.5,     0.0, 1.0, 0.0,    1.0, 0.0], // northeast corner
        [0.5, 0.0, 0.5,      0.0, 1.0, 0.0,    1.0, 1.0], // southeast corner
        [-0.5, 0.0, 0.5,     0.0, 1.0, 0.0,    0.0, 1.0], // southwest corner
    ];

    let positions: Vec<[f32; 3]> = vertices.iter().map(|v| [v[0], v[1], v[2]]).collect();
    let normals: Vec<[f32; 3]> = vertices.iter().map(|v| [v[3], v[4], v[5]]).collect();
    let uvs: Vec<[f32; 2]> = vertices.iter().map(|v| [v[6], v[7]]).collect();
    let indices = vec![0, 2, 1, 0, 3, 2]; // counter-clockwise seen from above

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));

    mesh
}

/// Scene transform for the map quad of the given ground extent (meters)
pub fn map_quad_transform(transform: MapTransform, width: f32, height: f32) -> Transform {
    Transform::from_translation(enu_to_world(transform.position))
        .with_rotation(enu_rotation_to_world(transform.orientation))
        .with_scale(Vec3::new(width, 1.0, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_system::compositor::CompositeStatus;

    #[test]
    fn quad_is_scaled_to_footprint() {
        let placed = map_quad_transform(
            MapTransform {
                position: Vec3::new(-5.0, 10.0, 0.0),
                orientation: Quat::IDENTITY,
            },
            100.0,
            50.0,
        );
        assert_eq!(placed.translation, Vec3::new(-5.0, 0.0, -10.0));
        assert_eq!(placed.scale, Vec3::new(100.0, 1.0, 50.0));
        assert_eq!(placed.rotation, Quat::IDENTITY);
    }

    #[test]
    fn heading_rotates_about_up_axis() {
        // 90 degrees counter-clockwise about ENU up
        let yaw = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let placed = map_quad_transform(
            MapTransform {
                position: Vec3::ZERO,
                orientation: yaw,
            },
            1.0,
            1.0,
        );
        // ENU east (1,0,0) turns to ENU north (0,1,0), i.e. world -Z
        let east = placed.rotation * Vec3::X;
        assert!((east - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5, "{east}");
    }

    #[test]
    fn texture_matches_composite() {
        let composite = CompositeTexture {
            width: 3,
            height: 2,
            pixels: vec![7; 3 * 2 * 4],
            ground_width: 3.0,
            ground_height: 2.0,
            loaded: 1,
            failed: 0,
            status: CompositeStatus::Complete,
        };
        let image = create_image_from_composite(&composite);
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.data, composite.pixels);
    }
}
