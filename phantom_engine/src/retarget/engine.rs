//! 手臂重定向引擎
//!
//! 每帧把捕获骨骼的肩、肘旋转映射到模型的四根手臂骨骼上：
//! 按 [`ArmState`] 查表得到源旋转，再套用该骨骼的修正帧后写入。
//! 输出只取决于 (ArmState, 捕获旋转, 固定常量)，没有跨帧状态。

use glam::Quat;
use std::f32::consts::FRAC_PI_2;

use super::arm_state::{ArmBone, ArmState, Segment, Side, SourceSelector};
use super::frame::{mirror_sagittal, mirror_yawed, ArmFrames, CorrectionFrame};
use crate::skeleton::{SkeletonTracker, TargetSkeleton, TrackedUser};

/// 默认跟踪的用户 ID
pub const DEFAULT_USER_ID: u32 = 1;

/// 一次重定向的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetOutcome {
    /// 跟踪设备尚未就绪
    NotReady,
    /// 用户不存在或未被跟踪，骨骼保持上一帧的姿态
    UserNotTracked,
    /// 写入了 `written` 根骨骼
    Applied { written: usize },
}

/// 手臂重定向器
#[derive(Debug, Clone)]
pub struct ArmRetargeter {
    frames: ArmFrames,
    /// 冻结上臂的固定姿态（左、右）
    frozen_upper: [Quat; 2],
    user_id: u32,
}

impl ArmRetargeter {
    pub fn new() -> Self {
        Self {
            frames: ArmFrames::default(),
            frozen_upper: [Quat::from_rotation_x(FRAC_PI_2); 2],
            user_id: DEFAULT_USER_ID,
        }
    }

    pub fn with_frames(mut self, frames: ArmFrames) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_frozen_pose(mut self, side: Side, rotation: Quat) -> Self {
        self.frozen_upper[side.index()] = rotation.normalize();
        self
    }

    pub fn with_user_id(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn frames(&self) -> &ArmFrames {
        &self.frames
    }

    fn frame_for(&self, bone: ArmBone) -> &CorrectionFrame {
        match (bone.side, bone.segment) {
            (Side::Left, Segment::Upper) => &self.frames.left_upper,
            (Side::Left, Segment::Lower) => &self.frames.left_lower,
            (Side::Right, Segment::Upper) => &self.frames.right_upper,
            (Side::Right, Segment::Lower) => &self.frames.right_lower,
        }
    }

    /// 按模式选出源旋转（未修正）；所需的捕获关节缺失时返回 None
    pub fn resolve_source(&self, state: ArmState, bone: ArmBone, user: &TrackedUser) -> Option<Quat> {
        match state.selector(bone) {
            SourceSelector::SameSide => user.joint_rotation(bone.tracked_joint_name()),
            SourceSelector::OppositeMirrored => user
                .joint_rotation(bone.mirrored().tracked_joint_name())
                .map(mirror_sagittal),
            SourceSelector::OppositeMirroredYawed => user
                .joint_rotation(bone.mirrored().tracked_joint_name())
                .map(mirror_yawed),
            SourceSelector::FrozenPose => Some(self.frozen_upper[bone.side.index()]),
            SourceSelector::Identity => Some(Quat::IDENTITY),
        }
    }

    /// 源旋转套用修正帧后的结果
    pub fn corrected_rotation(&self, state: ArmState, bone: ArmBone, user: &TrackedUser) -> Option<Quat> {
        self.resolve_source(state, bone, user)
            .map(|source| self.frame_for(bone).apply(source))
    }

    /// 对一个已跟踪用户执行重定向，返回写入的骨骼数
    ///
    /// 目标骨骼或捕获关节缺失时静默跳过该骨骼。
    pub fn apply_user<S>(&self, user: &TrackedUser, target: &mut S, state: ArmState) -> usize
    where
        S: TargetSkeleton + ?Sized,
    {
        let mut written = 0;
        for bone in ArmBone::ALL {
            let Some(rotation) = self.corrected_rotation(state, bone, user) else {
                log::trace!("[重定向] {:?} 缺少捕获关节，跳过", bone);
                continue;
            };
            if target.set_local_rotation(bone.target_bone_name(), rotation) {
                written += 1;
            } else {
                log::trace!("[重定向] 模型没有骨骼 '{}'，跳过", bone.target_bone_name());
            }
        }
        written
    }

    /// 完整的一帧：检查设备、拉取跟踪结果、检查用户，然后写骨骼
    pub fn retarget_frame<T, S>(&self, tracker: &mut T, target: &mut S, state: ArmState) -> RetargetOutcome
    where
        T: SkeletonTracker + ?Sized,
        S: TargetSkeleton + ?Sized,
    {
        if !tracker.ready() {
            return RetargetOutcome::NotReady;
        }
        tracker.update();

        match tracker.user(self.user_id) {
            Some(user) if user.is_tracked() => RetargetOutcome::Applied {
                written: self.apply_user(user, target, state),
            },
            _ => RetargetOutcome::UserNotTracked,
        }
    }
}

impl Default for ArmRetargeter {
    fn default() -> Self {
        Self::new()
    }
}
