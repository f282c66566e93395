//! 手臂模式与源旋转选择表

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::skeleton::{target_bones, tracked_joints};

/// 左 / 右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// 本侧在世界空间 X 方向上的符号，`left_x_sign` 为左手所在一侧的符号
    pub fn x_sign(self, left_x_sign: f32) -> f32 {
        match self {
            Side::Left => left_x_sign,
            Side::Right => -left_x_sign,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// 上臂 / 前臂
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Upper,
    Lower,
}

/// 四根被重定向的手臂骨骼之一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmBone {
    pub side: Side,
    pub segment: Segment,
}

impl ArmBone {
    pub const LEFT_UPPER: ArmBone = ArmBone { side: Side::Left, segment: Segment::Upper };
    pub const LEFT_LOWER: ArmBone = ArmBone { side: Side::Left, segment: Segment::Lower };
    pub const RIGHT_UPPER: ArmBone = ArmBone { side: Side::Right, segment: Segment::Upper };
    pub const RIGHT_LOWER: ArmBone = ArmBone { side: Side::Right, segment: Segment::Lower };

    pub const ALL: [ArmBone; 4] = [
        ArmBone::LEFT_UPPER,
        ArmBone::LEFT_LOWER,
        ArmBone::RIGHT_UPPER,
        ArmBone::RIGHT_LOWER,
    ];

    /// 目标模型上的骨骼名称
    pub fn target_bone_name(self) -> &'static str {
        match (self.side, self.segment) {
            (Side::Left, Segment::Upper) => target_bones::LEFT_UPPER_ARM,
            (Side::Left, Segment::Lower) => target_bones::LEFT_LOWER_ARM,
            (Side::Right, Segment::Upper) => target_bones::RIGHT_UPPER_ARM,
            (Side::Right, Segment::Lower) => target_bones::RIGHT_LOWER_ARM,
        }
    }

    /// 对应的捕获关节名称（同侧）
    pub fn tracked_joint_name(self) -> &'static str {
        match (self.side, self.segment) {
            (Side::Left, Segment::Upper) => tracked_joints::LEFT_SHOULDER,
            (Side::Left, Segment::Lower) => tracked_joints::LEFT_ELBOW,
            (Side::Right, Segment::Upper) => tracked_joints::RIGHT_SHOULDER,
            (Side::Right, Segment::Lower) => tracked_joints::RIGHT_ELBOW,
        }
    }

    /// 另一侧的同段骨骼
    pub fn mirrored(self) -> ArmBone {
        ArmBone {
            side: self.side.opposite(),
            segment: self.segment,
        }
    }

    fn index(self) -> usize {
        self.side.index() * 2
            + match self.segment {
                Segment::Upper => 0,
                Segment::Lower => 1,
            }
    }
}

/// 手臂模式
///
/// 带方向的模式都以被替代的一侧命名：`LeftMirror` 表示模型左臂由捕获到的右臂镜像驱动。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArmState {
    /// 双臂 1:1 映射
    #[default]
    BothArms,
    LeftFrozen,
    RightFrozen,
    LeftMirror,
    RightMirror,
    LeftCopy,
    RightCopy,
}

/// 某根骨骼的源旋转从哪里来
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelector {
    /// 同侧捕获关节
    SameSide,
    /// 对侧捕获关节，镜像分解
    OppositeMirrored,
    /// 对侧捕获关节，镜像分解再绕 Y 转 180°
    OppositeMirroredYawed,
    /// 固定的冻结姿态
    FrozenPose,
    /// 单位旋转
    Identity,
}

use SourceSelector::{FrozenPose, Identity, OppositeMirrored, OppositeMirroredYawed, SameSide};

/// (ArmState, 骨骼) → 源选择；列顺序与 `ArmBone::ALL` 一致
const SELECTOR_TABLE: [[SourceSelector; 4]; 7] = [
    // 左上臂, 左前臂, 右上臂, 右前臂
    [SameSide, SameSide, SameSide, SameSide],                         // BothArms
    [FrozenPose, Identity, SameSide, SameSide],                       // LeftFrozen
    [SameSide, SameSide, FrozenPose, Identity],                       // RightFrozen
    [OppositeMirrored, OppositeMirrored, SameSide, SameSide],         // LeftMirror
    [SameSide, SameSide, OppositeMirrored, OppositeMirrored],         // RightMirror
    [OppositeMirroredYawed, OppositeMirrored, SameSide, SameSide],    // LeftCopy
    [SameSide, SameSide, OppositeMirroredYawed, OppositeMirrored],    // RightCopy
];

impl ArmState {
    pub const ALL: [ArmState; 7] = [
        ArmState::BothArms,
        ArmState::LeftFrozen,
        ArmState::RightFrozen,
        ArmState::LeftMirror,
        ArmState::RightMirror,
        ArmState::LeftCopy,
        ArmState::RightCopy,
    ];

    pub fn selector(self, bone: ArmBone) -> SourceSelector {
        SELECTOR_TABLE[self.as_u8() as usize][bone.index()]
    }

    /// 被替代（冻结 / 镜像 / 复制）的一侧
    pub fn substituted_side(self) -> Option<Side> {
        match self {
            ArmState::BothArms => None,
            ArmState::LeftFrozen | ArmState::LeftMirror | ArmState::LeftCopy => Some(Side::Left),
            ArmState::RightFrozen | ArmState::RightMirror | ArmState::RightCopy => Some(Side::Right),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ArmState::BothArms => 0,
            ArmState::LeftFrozen => 1,
            ArmState::RightFrozen => 2,
            ArmState::LeftMirror => 3,
            ArmState::RightMirror => 4,
            ArmState::LeftCopy => 5,
            ArmState::RightCopy => 6,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// 界面按钮循环切换用
    pub fn next(self) -> Self {
        Self::ALL[(self.as_u8() as usize + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArmState::BothArms => "both arms",
            ArmState::LeftFrozen => "left frozen",
            ArmState::RightFrozen => "right frozen",
            ArmState::LeftMirror => "left mirror",
            ArmState::RightMirror => "right mirror",
            ArmState::LeftCopy => "left copy",
            ArmState::RightCopy => "right copy",
        };
        f.write_str(label)
    }
}

/// 可在界面回调之间共享的手臂模式
///
/// 克隆后所有副本观察同一个值；界面线程写、渲染线程每帧读。
#[derive(Clone, Debug, Default)]
pub struct SharedArmState {
    value: Arc<AtomicU8>,
}

impl SharedArmState {
    pub fn new(state: ArmState) -> Self {
        Self {
            value: Arc::new(AtomicU8::new(state.as_u8())),
        }
    }

    pub fn get(&self) -> ArmState {
        ArmState::from_u8(self.value.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set(&self, state: ArmState) {
        self.value.store(state.as_u8(), Ordering::Release);
    }

    /// 切换到下一个模式并返回它
    pub fn cycle(&self) -> ArmState {
        let next = self.get().next();
        self.set(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_arms_is_direct_everywhere() {
        for bone in ArmBone::ALL {
            assert_eq!(ArmState::BothArms.selector(bone), SourceSelector::SameSide);
        }
    }

    #[test]
    fn test_frozen_side_uses_fixed_pose() {
        assert_eq!(ArmState::LeftFrozen.selector(ArmBone::LEFT_UPPER), SourceSelector::FrozenPose);
        assert_eq!(ArmState::LeftFrozen.selector(ArmBone::LEFT_LOWER), SourceSelector::Identity);
        assert_eq!(ArmState::LeftFrozen.selector(ArmBone::RIGHT_UPPER), SourceSelector::SameSide);
        assert_eq!(ArmState::RightFrozen.selector(ArmBone::RIGHT_UPPER), SourceSelector::FrozenPose);
        assert_eq!(ArmState::RightFrozen.selector(ArmBone::RIGHT_LOWER), SourceSelector::Identity);
    }

    #[test]
    fn test_copy_yaws_only_upper_arm() {
        assert_eq!(ArmState::RightCopy.selector(ArmBone::RIGHT_UPPER), SourceSelector::OppositeMirroredYawed);
        assert_eq!(ArmState::RightCopy.selector(ArmBone::RIGHT_LOWER), SourceSelector::OppositeMirrored);
        assert_eq!(ArmState::LeftCopy.selector(ArmBone::LEFT_UPPER), SourceSelector::OppositeMirroredYawed);
        assert_eq!(ArmState::LeftCopy.selector(ArmBone::RIGHT_LOWER), SourceSelector::SameSide);
    }

    #[test]
    fn test_table_is_symmetric_between_sides() {
        let pairs = [
            (ArmState::LeftFrozen, ArmState::RightFrozen),
            (ArmState::LeftMirror, ArmState::RightMirror),
            (ArmState::LeftCopy, ArmState::RightCopy),
        ];
        for (left, right) in pairs {
            for bone in ArmBone::ALL {
                assert_eq!(left.selector(bone), right.selector(bone.mirrored()));
            }
        }
    }

    #[test]
    fn test_u8_conversion_and_cycle() {
        for state in ArmState::ALL {
            assert_eq!(ArmState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(ArmState::from_u8(42), None);
        assert_eq!(ArmState::RightCopy.next(), ArmState::BothArms);
    }

    #[test]
    fn test_shared_state_is_seen_by_clones() {
        let shared = SharedArmState::new(ArmState::BothArms);
        let button = {
            let handle = shared.clone();
            move || handle.set(ArmState::LeftMirror)
        };
        button();
        assert_eq!(shared.get(), ArmState::LeftMirror);
        assert_eq!(shared.cycle(), ArmState::RightMirror);
    }

    #[test]
    fn test_bone_names() {
        assert_eq!(ArmBone::LEFT_UPPER.target_bone_name(), "luparm");
        assert_eq!(ArmBone::RIGHT_LOWER.tracked_joint_name(), "Right Elbow");
        assert_eq!(ArmBone::LEFT_LOWER.mirrored(), ArmBone::RIGHT_LOWER);
    }
}
