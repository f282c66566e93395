//! PhantomLimb Engine - 幻肢康复应用的实时核心
//!
//! 提供以下功能：
//! - 捕获骨骼 → 模型骨骼的手臂重定向（镜像 / 冻结 / 复制模式）
//! - 手部锚点投影（骨骼蒙皮矩阵 → 世界空间手部位置）
//! - 接球小游戏的刚体物理世界（Rapier3D）
//! - 发球策略与游戏设置
//!
//! 渲染、头显、深度相机驱动和蒙皮网格变形都在外部完成，本库只通过
//! [`skeleton::TargetSkeleton`] 与 [`skeleton::SkeletonTracker`] 两个接口与其交互。

pub mod game;
pub mod physics;
pub mod retarget;
pub mod skeleton;

pub use game::{FireTimer, FrameReport, GameSettings, MapSettings, RehabSession, SettingValue, SettingsProvider, SpawnPolicy};
pub use physics::{PhysicsConfig, PhysicsWorld};
pub use retarget::{ArmBone, ArmRetargeter, ArmState, HandAnchorProjector, HandAnchors, RetargetOutcome, SharedArmState, Side};
pub use skeleton::{Bone, BoneManager, CaptureTracker, SkeletonTracker, TargetSkeleton, TrackedUser};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhantomError {
    #[error("Missing setting: {0}")]
    MissingSetting(String),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Invalid physics parameter: {0}")]
    InvalidPhysicsParameter(String),

    #[error("Physics world has been released")]
    WorldReleased,

    #[error("Singular transform: {0}")]
    SingularTransform(String),
}

pub type Result<T> = std::result::Result<T, PhantomError>;
