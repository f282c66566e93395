//! 发球策略
//!
//! 每次发球抽两个 [0,1) 的均匀随机数 r0、r1：
//! - 水平位置随 r0 线性分布在发球宽度内；开启强调时只落在被替代手臂的一侧
//! - 高度、上抛速度和飞向玩家的速度都是 r1 的线性函数

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::physics::PhysicsWorld;
use crate::retarget::ArmState;
use crate::Result;

/// 发球参数
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTuning {
    pub ball_radius: f32,
    pub width: f32,
    pub height_min: f32,
    pub height_factor: f32,
    pub speed_min: f32,
    pub speed_factor: f32,
    pub lift_min: f32,
    pub lift_factor: f32,
    /// 发球点的 Z 坐标，小球朝 -Z 飞向玩家
    pub distance: f32,
    pub emphasis: bool,
    /// 玩家左手所在一侧的 X 符号（±1）
    pub left_x_sign: f32,
}

/// 一次发球的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    pub radius: f32,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl SpawnTuning {
    /// 由两个随机值计算发球参数（纯函数）
    pub fn spawn_params(&self, state: ArmState, r0: f32, r1: f32) -> SpawnParams {
        let x = match state.substituted_side() {
            Some(side) if self.emphasis => side.x_sign(self.left_x_sign) * r0 * self.width * 0.5,
            _ => (r0 - 0.5) * self.width,
        };
        let y = self.height_min + r1 * self.height_factor;
        let velocity = Vec3::new(
            0.0,
            self.lift_min + r1 * self.lift_factor,
            -(self.speed_min + r1 * self.speed_factor),
        );

        SpawnParams {
            radius: self.ball_radius,
            position: Vec3::new(x, y, self.distance),
            velocity,
        }
    }
}

/// 发球器：持有参数和随机数发生器
pub struct SpawnPolicy {
    tuning: SpawnTuning,
    rng: Pcg32,
}

impl SpawnPolicy {
    /// 固定种子，便于复现
    pub fn new(tuning: SpawnTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(tuning: SpawnTuning) -> Self {
        Self {
            tuning,
            rng: Pcg32::from_entropy(),
        }
    }

    pub fn tuning(&self) -> &SpawnTuning {
        &self.tuning
    }

    pub fn tuning_mut(&mut self) -> &mut SpawnTuning {
        &mut self.tuning
    }

    /// 抽取随机数并向物理世界发射一个小球
    pub fn fire_ball(&mut self, world: &PhysicsWorld, state: ArmState) -> Result<SpawnParams> {
        let r0: f32 = self.rng.gen();
        let r1: f32 = self.rng.gen();
        let params = self.tuning.spawn_params(state, r0, r1);
        world.add_ball(params.radius, params.position, params.velocity)?;
        log::debug!(
            "[发球] 位置=({:.2},{:.2},{:.2}), 速度=({:.2},{:.2},{:.2})",
            params.position.x, params.position.y, params.position.z,
            params.velocity.x, params.velocity.y, params.velocity.z
        );
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tuning() -> SpawnTuning {
        SpawnTuning {
            ball_radius: 0.5,
            width: 4.0,
            height_min: 1.0,
            height_factor: 0.5,
            speed_min: 4.0,
            speed_factor: 2.0,
            lift_min: 1.0,
            lift_factor: 1.0,
            distance: 20.0,
            emphasis: false,
            left_x_sign: -1.0,
        }
    }

    #[test]
    fn test_linear_in_random_values() {
        let t = tuning();
        let low = t.spawn_params(ArmState::BothArms, 0.0, 0.0);
        assert_relative_eq!(low.position.x, -2.0);
        assert_relative_eq!(low.position.y, 1.0);
        assert_relative_eq!(low.velocity.z, -4.0);
        assert_relative_eq!(low.velocity.y, 1.0);

        let mid = t.spawn_params(ArmState::BothArms, 0.5, 0.5);
        assert_relative_eq!(mid.position.x, 0.0);
        assert_relative_eq!(mid.position.y, 1.25);
        assert_relative_eq!(mid.velocity.z, -5.0);
        assert_relative_eq!(mid.position.z, 20.0);
    }

    #[test]
    fn test_zero_width_always_spawns_at_centre() {
        let world = PhysicsWorld::new(-10.0, 0.1).unwrap();
        for emphasis in [false, true] {
            let mut policy = SpawnPolicy::new(SpawnTuning { width: 0.0, emphasis, ..tuning() }, 7);
            for state in ArmState::ALL {
                for _ in 0..10 {
                    let params = policy.fire_ball(&world, state).unwrap();
                    assert_eq!(params.position.x, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_emphasis_narrows_towards_substituted_side() {
        let t = SpawnTuning { emphasis: true, ..tuning() };
        for step in 0..10 {
            let r0 = step as f32 / 10.0;
            let left = t.spawn_params(ArmState::LeftMirror, r0, 0.3).position.x;
            let right = t.spawn_params(ArmState::RightFrozen, r0, 0.3).position.x;
            assert!((-2.0..=0.0).contains(&left));
            assert!((0.0..=2.0).contains(&right));
        }
        // 双臂模式下强调不起作用
        let both = t.spawn_params(ArmState::BothArms, 0.0, 0.0).position.x;
        assert_relative_eq!(both, -2.0);
    }

    #[test]
    fn test_emphasis_follows_left_side_sign() {
        let t = SpawnTuning { emphasis: true, left_x_sign: 1.0, ..tuning() };
        let left = t.spawn_params(ArmState::LeftCopy, 0.8, 0.3).position.x;
        let right = t.spawn_params(ArmState::RightMirror, 0.8, 0.3).position.x;
        assert_relative_eq!(left, 1.6);
        assert_relative_eq!(right, -1.6);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let world = PhysicsWorld::new(-10.0, 0.1).unwrap();
        let mut a = SpawnPolicy::new(tuning(), 42);
        let mut b = SpawnPolicy::new(tuning(), 42);
        for _ in 0..5 {
            assert_eq!(
                a.fire_ball(&world, ArmState::BothArms).unwrap(),
                b.fire_ball(&world, ArmState::BothArms).unwrap()
            );
        }
        assert_eq!(world.ball_count(), 10);
    }
}
