//! glam 与 Rapier (nalgebra) 之间的数学类型转换

use glam::{Mat4, Quat, Vec3};
use rapier3d::prelude::*;

/// 将 glam Vec3 转换为 Rapier Vector
pub fn vec3_to_rapier(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

/// 将 Rapier Vector 转换为 glam Vec3
pub fn rapier_to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// 将 Rapier Isometry 转换为 glam Mat4（旋转 + 平移）
pub fn isometry_to_mat4(iso: &Isometry<Real>) -> Mat4 {
    let translation = rapier_to_vec3(&iso.translation.vector);
    // UnitQuaternion 的 coords 顺序为 (i, j, k, w)
    let coords = iso.rotation.quaternion().coords;
    let rotation = Quat::from_xyzw(coords[0], coords[1], coords[2], coords[3]);
    Mat4::from_rotation_translation(rotation, translation)
}
