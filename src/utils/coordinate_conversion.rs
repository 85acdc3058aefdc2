use bevy::prelude::*;

/// Convert a local east/north/up vector to world coordinates
pub fn enu_to_world(enu: Vec3) -> Vec3 {
    // Our world coordinate system has:
    // - X increases eastward
    // - Y is up
    // - Z increases southward, so north is -Z
    Vec3::new(enu.x, enu.z, -enu.y)
}

/// Express a rotation given in the east/north/up frame in world axes
pub fn enu_rotation_to_world(rotation: Quat) -> Quat {
    // The axis change is a proper rotation, so the quaternion's vector part
    // maps like any other vector
    let axis = enu_to_world(Vec3::new(rotation.x, rotation.y, rotation.z));
    Quat::from_xyzw(axis.x, axis.y, axis.z, rotation.w)
}
