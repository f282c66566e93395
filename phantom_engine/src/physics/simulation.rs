//! 接球游戏的 Rapier 物理世界
//!
//! ## 物体
//! | 物体 | Rapier |
//! |------|--------|
//! | 地面 | fixed 刚体 + cuboid |
//! | 左右手 | kinematic_position_based 刚体 + ball，永不休眠 |
//! | 小球 | dynamic 刚体 + ball，开启 CCD |
//!
//! 本结构不加锁，由 [`PhysicsWorld`](super::PhysicsWorld) 在互斥锁内访问。

use glam::{Mat4, Vec3};
use rapier3d::prelude::*;
use std::num::NonZeroUsize;

use super::config::PhysicsConfig;
use super::convert::{isometry_to_mat4, rapier_to_vec3, vec3_to_rapier};
use crate::retarget::Side;

/// 一个飞行中的小球：刚体句柄与缓存的世界变换成对存放
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ball {
    pub body: RigidBodyHandle,
    pub transform: Mat4,
}

pub(crate) struct Simulation {
    /// 物理流水线
    physics_pipeline: PhysicsPipeline,
    /// 积分参数
    integration_parameters: IntegrationParameters,
    /// 岛管理器
    island_manager: IslandManager,
    /// 宽相检测
    broad_phase: DefaultBroadPhase,
    /// 窄相检测
    narrow_phase: NarrowPhase,
    /// 刚体集合
    rigid_body_set: RigidBodySet,
    /// 碰撞体集合
    collider_set: ColliderSet,
    /// 关节集合（本游戏不用，流水线需要）
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    /// CCD 求解器
    ccd_solver: CCDSolver,
    /// 重力向量
    gravity: Vector<Real>,
    /// 地面刚体句柄
    #[allow(dead_code)]
    ground_handle: RigidBodyHandle,
    /// 左右手刚体句柄（按 Side 索引）
    hand_handles: [RigidBodyHandle; 2],
    /// 飞行中的小球
    balls: Vec<Ball>,
    fixed_dt: f32,
    max_substep_count: u32,
    ball_mass: f32,
    ball_restitution: f32,
}

impl Simulation {
    /// 按配置建立地面和两只手，小球池为空
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        // 地面：大的静态盒子，位于发球区域正下方
        let ground = RigidBodyBuilder::fixed()
            .translation(Vector::new(0.0, config.ground_center_y, 0.0))
            .build();
        let ground_handle = rigid_body_set.insert(ground);
        let ground_collider = ColliderBuilder::cuboid(
            config.ground_half_extent,
            config.ground_half_extent,
            config.ground_half_extent,
        )
        .build();
        collider_set.insert_with_parent(ground_collider, ground_handle, &mut rigid_body_set);

        // 双手：运动学刚体，质量无穷大，位置只由 move_hand 决定
        let hand_handles = [Side::Left, Side::Right].map(|_| {
            let hand = RigidBodyBuilder::kinematic_position_based()
                .translation(Vector::new(0.0, 0.0, 0.0))
                .can_sleep(false)
                .build();
            let handle = rigid_body_set.insert(hand);
            let collider = ColliderBuilder::ball(config.hand_radius)
                .restitution(config.hand_restitution)
                .build();
            collider_set.insert_with_parent(collider, handle, &mut rigid_body_set);
            handle
        });

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_timestep();
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(config.solver_iterations).unwrap_or(NonZeroUsize::MIN);

        if config.debug_log {
            log::info!(
                "[物理配置] FPS={}, 重力Y={}, 手半径={}, 小球上限={}, 最大子步={}",
                config.physics_fps, config.gravity_y, config.hand_radius, config.ball_cap, config.max_substep_count
            );
        }

        Self {
            physics_pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, config.gravity_y, 0.0),
            ground_handle,
            hand_handles,
            balls: Vec::new(),
            fixed_dt: config.fixed_timestep(),
            max_substep_count: config.max_substep_count.max(1),
            ball_mass: config.ball_mass,
            ball_restitution: config.ball_restitution,
        }
    }

    /// 添加一个动态小球（刚体与缓存变换一起追加）
    pub fn add_ball(&mut self, radius: f32, position: Vec3, velocity: Vec3) {
        let body = RigidBodyBuilder::dynamic()
            .translation(vec3_to_rapier(position))
            .linvel(vec3_to_rapier(velocity))
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .mass(self.ball_mass)
            .restitution(self.ball_restitution)
            .build();
        self.collider_set.insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.balls.push(Ball {
            body: handle,
            transform: Mat4::from_translation(position),
        });
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn ball_transforms(&self) -> Vec<Mat4> {
        self.balls.iter().map(|ball| ball.transform).collect()
    }

    /// 推进 `dt` 秒，返回实际执行的子步数
    ///
    /// 子步数 = ceil(dt / fixed_dt)，限制在 [1, max_substep_count]；
    /// 每个子步不超过 fixed_dt，超出上限的时间被丢弃。
    pub fn step(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        let substeps = ((dt / self.fixed_dt).ceil() as u32).clamp(1, self.max_substep_count);
        self.integration_parameters.dt = (dt / substeps as f32).min(self.fixed_dt);

        for _ in 0..substeps {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
        }

        self.refresh_ball_transforms();
        substeps
    }

    /// 从刚体位置刷新小球缓存变换
    fn refresh_ball_transforms(&mut self) {
        for ball in &mut self.balls {
            if let Some(body) = self.rigid_body_set.get(ball.body) {
                ball.transform = isometry_to_mat4(body.position());
            }
        }
    }

    /// 设置手部运动学刚体的下一位置并保持唤醒
    pub fn move_hand(&mut self, side: Side, position: Vec3) {
        if let Some(hand) = self.rigid_body_set.get_mut(self.hand_handles[side.index()]) {
            hand.set_next_kinematic_translation(vec3_to_rapier(position));
            hand.wake_up(true);
        }
    }

    pub fn hand_position(&self, side: Side) -> Option<Vec3> {
        self.rigid_body_set
            .get(self.hand_handles[side.index()])
            .map(|hand| rapier_to_vec3(hand.translation()))
    }

    #[allow(dead_code)]
    pub fn ground_position(&self) -> Option<Vec3> {
        self.rigid_body_set
            .get(self.ground_handle)
            .map(|ground| rapier_to_vec3(ground.translation()))
    }
}
