//! 手部锚点投影
//!
//! 前臂骨骼的蒙皮矩阵作用在模型空间的手部锚点上，得到手部碰撞体应在的位置：
//! `world = inverse(model_base) · skinning(lower_arm) · anchor`。
//! 必须在骨骼更新之后、物理步进之前调用，否则碰撞体会落后可见姿态一帧。

use glam::{Mat4, Vec3};

use super::arm_state::{ArmBone, Segment, Side};
use crate::physics::PhysicsWorld;
use crate::skeleton::TargetSkeleton;
use crate::{PhantomError, Result};

/// 每只手在模型空间中的锚点（模型标定时确定）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAnchors {
    pub left: Vec3,
    pub right: Vec3,
}

impl HandAnchors {
    pub fn new(left: Vec3, right: Vec3) -> Self {
        Self { left, right }
    }

    pub fn get(&self, side: Side) -> Vec3 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// 手部锚点投影器
#[derive(Debug, Clone)]
pub struct HandAnchorProjector {
    anchors: HandAnchors,
    inverse_model_base: Mat4,
}

impl HandAnchorProjector {
    pub fn new(anchors: HandAnchors) -> Self {
        Self {
            anchors,
            inverse_model_base: Mat4::IDENTITY,
        }
    }

    /// 设置整个角色的外部放置矩阵；矩阵不可逆时报错
    pub fn with_model_base(mut self, model_base: Mat4) -> Result<Self> {
        let det = model_base.determinant();
        if !det.is_finite() || det.abs() < 1.0e-8 {
            return Err(PhantomError::SingularTransform(format!(
                "model base transform has determinant {det}"
            )));
        }
        self.inverse_model_base = model_base.inverse();
        Ok(self)
    }

    pub fn anchors(&self) -> &HandAnchors {
        &self.anchors
    }

    /// 计算一只手的位置；模型缺少前臂骨骼时返回 None
    pub fn project<S>(&self, skeleton: &S, side: Side) -> Option<Vec3>
    where
        S: TargetSkeleton + ?Sized,
    {
        let bone = ArmBone { side, segment: Segment::Lower };
        let skinning = skeleton.skinning_transform(bone.target_bone_name())?;
        Some((self.inverse_model_base * skinning).transform_point3(self.anchors.get(side)))
    }

    /// 投影两只手并移动物理世界中的手部碰撞体，返回移动的手数
    pub fn project_hands<S>(&self, skeleton: &S, world: &PhysicsWorld) -> usize
    where
        S: TargetSkeleton + ?Sized,
    {
        let mut moved = 0;
        for side in Side::ALL {
            if let Some(position) = self.project(skeleton, side) {
                world.move_hand(side, position);
                moved += 1;
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Bone, BoneManager};
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    fn left_arm() -> BoneManager {
        let mut manager = BoneManager::new();
        let upper = manager.add_bone(Bone::new("luparm").with_offset(Vec3::new(1.0, 10.0, 0.0)));
        manager.add_bone(Bone::new("lloarm").with_parent(upper).with_offset(Vec3::new(2.0, 0.0, 0.0)));
        manager.build_hierarchy();
        manager
    }

    fn anchors() -> HandAnchors {
        HandAnchors::new(Vec3::new(4.0, 10.0, 0.0), Vec3::new(-4.0, 10.0, 0.0))
    }

    #[test]
    fn test_rest_pose_projects_anchor_unchanged() {
        let projector = HandAnchorProjector::new(anchors());
        let position = projector.project(&left_arm(), Side::Left).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(4.0, 10.0, 0.0), 1e-5));
    }

    #[test]
    fn test_anchor_follows_lower_arm() {
        let mut skeleton = left_arm();
        skeleton.set_local_rotation("lloarm", Quat::from_rotation_z(FRAC_PI_2));
        skeleton.update();
        let position = HandAnchorProjector::new(anchors()).project(&skeleton, Side::Left).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(3.0, 11.0, 0.0), 1e-4));
    }

    #[test]
    fn test_model_base_is_inverted() {
        let base = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let projector = HandAnchorProjector::new(anchors()).with_model_base(base).unwrap();
        let position = projector.project(&left_arm(), Side::Left).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(4.0, 5.0, 0.0), 1e-5));
    }

    #[test]
    fn test_singular_model_base_is_rejected() {
        let result = HandAnchorProjector::new(anchors()).with_model_base(Mat4::ZERO);
        assert!(matches!(result, Err(PhantomError::SingularTransform(_))));
    }

    #[test]
    fn test_missing_lower_arm_skips_hand() {
        let projector = HandAnchorProjector::new(anchors());
        assert!(projector.project(&left_arm(), Side::Right).is_none());

        let world = PhysicsWorld::new(-10.0, 0.1).unwrap();
        assert_eq!(projector.project_hands(&left_arm(), &world), 1);
        world.update(1.0 / 60.0);
        let hand = world.hand_position(Side::Left).unwrap();
        assert!(hand.abs_diff_eq(Vec3::new(4.0, 10.0, 0.0), 1e-4));
    }
}
