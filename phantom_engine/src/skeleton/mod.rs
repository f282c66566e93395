//! 骨骼系统：目标模型骨骼与捕获骨骼

mod bone;
mod manager;
mod tracker;

pub use bone::Bone;
pub use manager::BoneManager;
pub use tracker::{CaptureSender, CaptureTracker, SkeletonTracker, TrackedUser};

use glam::{Mat4, Quat};

/// 目标模型（MD5 模型）的手臂骨骼名称
pub mod target_bones {
    pub const LEFT_UPPER_ARM: &str = "luparm";
    pub const LEFT_LOWER_ARM: &str = "lloarm";
    pub const RIGHT_UPPER_ARM: &str = "ruparm";
    pub const RIGHT_LOWER_ARM: &str = "rloarm";
}

/// 捕获骨骼（深度相机跟踪器）的关节名称
pub mod tracked_joints {
    pub const LEFT_SHOULDER: &str = "Left Shoulder";
    pub const LEFT_ELBOW: &str = "Left Elbow";
    pub const RIGHT_SHOULDER: &str = "Right Shoulder";
    pub const RIGHT_ELBOW: &str = "Right Elbow";
}

/// 被重定向写入的目标骨骼
///
/// 骨骼按名称访问；名称不存在时返回 `None` / `false`，调用方静默跳过。
pub trait TargetSkeleton {
    /// 设置骨骼相对静止姿态的局部旋转，骨骼不存在时返回 false
    fn set_local_rotation(&mut self, name: &str, rotation: Quat) -> bool;

    /// 骨骼当前的局部旋转
    fn local_rotation(&self, name: &str) -> Option<Quat>;

    /// 骨骼蒙皮矩阵（模型空间 → 蒙皮后空间）
    fn skinning_transform(&self, name: &str) -> Option<Mat4>;

    /// 旋转写入后重新计算全局变换
    fn update(&mut self);
}
