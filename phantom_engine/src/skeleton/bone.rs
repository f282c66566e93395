//! 骨骼节点

use glam::{Mat4, Quat, Vec3};

/// 骨骼节点
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub parent_index: i32,

    // 静止姿态（相对于父骨骼）
    pub bone_offset: Vec3,
    pub rest_rotation: Quat,
    // 逆绑定矩阵（在build_hierarchy中计算）
    pub inverse_bind_matrix: Mat4,

    // 相对于静止姿态的旋转，由重定向写入
    pub local_rotation: Quat,

    // 变换结果
    pub local_transform: Mat4,
    pub global_transform: Mat4,
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_index: -1,
            bone_offset: Vec3::ZERO,
            rest_rotation: Quat::IDENTITY,
            inverse_bind_matrix: Mat4::IDENTITY,
            local_rotation: Quat::IDENTITY,
            local_transform: Mat4::IDENTITY,
            global_transform: Mat4::IDENTITY,
        }
    }

    pub fn with_parent(mut self, parent_index: usize) -> Self {
        self.parent_index = parent_index as i32;
        self
    }

    /// 相对父骨骼的静止平移
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.bone_offset = offset;
        self
    }

    /// 相对父骨骼的静止旋转
    pub fn with_rest_rotation(mut self, rotation: Quat) -> Self {
        self.rest_rotation = rotation.normalize();
        self
    }

    /// 设置相对静止姿态的旋转
    pub fn set_rotation_relative(&mut self, rotation: Quat) {
        self.local_rotation = rotation;
    }

    pub fn rotation(&self) -> Quat {
        self.local_rotation
    }

    /// 静止姿态的本地变换
    pub fn rest_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rest_rotation, self.bone_offset)
    }

    /// 更新本地变换：平移 = bone_offset，旋转 = rest_rotation * local_rotation
    pub fn update_local_transform(&mut self) {
        let rotation = (self.rest_rotation * self.local_rotation).normalize();
        self.local_transform = Mat4::from_rotation_translation(rotation, self.bone_offset);
    }

    /// 获取蒙皮矩阵 = 当前全局变换 * 逆绑定矩阵
    pub fn get_skinning_matrix(&self) -> Mat4 {
        self.global_transform * self.inverse_bind_matrix
    }
}

impl Default for Bone {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_local_transform_composes_rest_and_rotation() {
        let mut bone = Bone::new("lloarm")
            .with_offset(Vec3::new(1.0, 0.0, 0.0))
            .with_rest_rotation(Quat::from_rotation_y(FRAC_PI_2));
        bone.set_rotation_relative(Quat::from_rotation_z(FRAC_PI_2));
        bone.update_local_transform();

        let (_, rotation, translation) = bone.local_transform.to_scale_rotation_translation();
        let expected = Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_z(FRAC_PI_2);
        assert!(rotation.abs_diff_eq(expected, 1e-5) || rotation.abs_diff_eq(-expected, 1e-5));
        assert!(translation.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_default_bone_is_root() {
        let bone = Bone::default();
        assert_eq!(bone.parent_index, -1);
        assert_eq!(bone.rotation(), Quat::IDENTITY);
    }
}
