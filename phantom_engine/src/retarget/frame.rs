//! 四元数坐标系修正
//!
//! 捕获骨骼与模型静止姿态的骨骼轴约定不同：捕获骨骼面向传感器（绕 Y 转了 180°），
//! 模型手臂沿 ±X 展开。修正帧 F 把捕获旋转换到模型骨骼的坐标系：`F * q * F⁻¹`。

use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

/// 向量部分长度低于此值时旋转角视为 0，轴无定义
pub const DEGENERATE_EPSILON: f32 = 1.0e-6;

/// 一对固定的修正四元数（正向、逆向）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrectionFrame {
    forward: Quat,
    inverse: Quat,
}

impl CorrectionFrame {
    pub const IDENTITY: Self = Self {
        forward: Quat::IDENTITY,
        inverse: Quat::IDENTITY,
    };

    pub fn new(forward: Quat) -> Self {
        let forward = forward.normalize();
        Self {
            forward,
            inverse: forward.inverse(),
        }
    }

    pub fn forward(&self) -> Quat {
        self.forward
    }

    pub fn inverse(&self) -> Quat {
        self.inverse
    }

    /// `F · q · F⁻¹`
    pub fn apply(&self, rotation: Quat) -> Quat {
        (self.forward * rotation * self.inverse).normalize()
    }
}

/// 四根手臂骨骼各自的修正帧
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmFrames {
    pub left_upper: CorrectionFrame,
    pub left_lower: CorrectionFrame,
    pub right_upper: CorrectionFrame,
    pub right_lower: CorrectionFrame,
}

impl Default for ArmFrames {
    fn default() -> Self {
        // 捕获骨骼面朝传感器；模型左臂沿 +90°、右臂沿 -90°（绕 Z）
        let facing = Quat::from_rotation_y(PI);
        let left = CorrectionFrame::new(facing * Quat::from_rotation_z(FRAC_PI_2));
        let right = CorrectionFrame::new(facing * Quat::from_rotation_z(-FRAC_PI_2));
        Self {
            left_upper: left,
            left_lower: left,
            right_upper: right,
            right_lower: right,
        }
    }
}

/// 分解为（角度，单位轴），角度 ∈ [0, 2π)
///
/// 角度接近 0 时轴无定义，返回 None。
pub fn to_angle_axis(rotation: Quat) -> Option<(f32, Vec3)> {
    let q = rotation.normalize();
    let v = Vec3::new(q.x, q.y, q.z);
    let length = v.length();
    if !length.is_finite() || length < DEGENERATE_EPSILON {
        return None;
    }
    let angle = 2.0 * length.atan2(q.w);
    Some((angle, v / length))
}

/// 由角度和轴重建四元数
pub fn from_angle_axis(angle: f32, axis: Vec3) -> Quat {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle),
        None => Quat::IDENTITY,
    }
}

/// 关于矢状面的镜像：角度取反，轴的 X 分量取反
///
/// 退化输入（角度≈0）映射为单位四元数。
pub fn mirror_sagittal(rotation: Quat) -> Quat {
    match to_angle_axis(rotation) {
        Some((angle, axis)) => from_angle_axis(-angle, Vec3::new(-axis.x, axis.y, axis.z)),
        None => Quat::IDENTITY,
    }
}

/// 镜像后再绕 Y 转 180°（复制模式的上臂）
pub fn mirror_yawed(rotation: Quat) -> Quat {
    (Quat::from_rotation_y(PI) * mirror_sagittal(rotation)).normalize()
}
