//! 可共享的物理世界句柄
//!
//! `PhysicsWorld` 是一个轻量句柄，克隆后所有副本操作同一个模拟；最后一个句柄
//! 释放时模拟被销毁。所有修改操作都在世界的互斥锁内进行；小球变换通过 `ArcSwap`
//! 发布，渲染线程读取时不加锁，拿到的是上一次发布的完整快照。

use arc_swap::ArcSwap;
use glam::{Mat4, Vec3};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::config::PhysicsConfig;
use super::simulation::Simulation;
use crate::retarget::Side;
use crate::{PhantomError, Result};

struct SharedWorld {
    config: PhysicsConfig,
    /// 只在重置窗口内为 false
    running: AtomicBool,
    simulation: Mutex<Simulation>,
    ball_transforms: ArcSwap<Vec<Mat4>>,
}

impl SharedWorld {
    fn lock(&self) -> MutexGuard<'_, Simulation> {
        // 重置会整体重建模拟，中毒的锁不会暴露半拆除的世界
        self.simulation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 在已持有的锁内拆除并重建整个模拟
    fn rebuild(&self, simulation: &mut Simulation) {
        self.running.store(false, Ordering::Release);
        *simulation = Simulation::new(&self.config);
        self.ball_transforms.store(Arc::new(Vec::new()));
        self.running.store(true, Ordering::Release);
    }

    fn publish(&self, simulation: &Simulation) {
        self.ball_transforms.store(Arc::new(simulation.ball_transforms()));
    }
}

impl Drop for SharedWorld {
    fn drop(&mut self) {
        log::debug!("[物理世界] 最后一个句柄已释放，销毁模拟");
    }
}

/// 接球游戏的物理世界句柄
#[derive(Clone, Default)]
pub struct PhysicsWorld {
    shared: Option<Arc<SharedWorld>>,
}

impl PhysicsWorld {
    /// 以给定重力和手部半径创建世界，其余参数取默认值
    pub fn new(gravity: f32, hand_radius: f32) -> Result<Self> {
        Self::with_config(PhysicsConfig::new(gravity, hand_radius))
    }

    /// 创建世界：地面、两只运动学手、空的小球池
    pub fn with_config(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        let simulation = Simulation::new(&config);

        log::info!(
            "[物理世界] 创建完成: 重力Y={}, 手半径={}, 小球上限={}",
            config.gravity_y, config.hand_radius, config.ball_cap
        );

        Ok(Self {
            shared: Some(Arc::new(SharedWorld {
                config,
                running: AtomicBool::new(true),
                simulation: Mutex::new(simulation),
                ball_transforms: ArcSwap::from_pointee(Vec::new()),
            })),
        })
    }

    /// 句柄是否指向一个世界
    pub fn is_valid(&self) -> bool {
        self.shared.is_some()
    }

    /// 放开本句柄；若是最后一个句柄则销毁世界
    pub fn release(&mut self) {
        self.shared = None;
    }

    /// 两个句柄是否指向同一个世界
    pub fn ptr_eq(&self, other: &PhysicsWorld) -> bool {
        match (&self.shared, &other.shared) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn config(&self) -> Option<&PhysicsConfig> {
        self.shared.as_deref().map(|shared| &shared.config)
    }

    pub fn is_running(&self) -> bool {
        self.shared
            .as_deref()
            .is_some_and(|shared| shared.running.load(Ordering::Acquire))
    }

    /// 拆除并重建整个模拟，重力与手部半径保持不变
    ///
    /// 如有步进正在进行，等待其完成。
    pub fn reset(&self) {
        let Some(shared) = self.shared.as_deref() else {
            return;
        };
        let mut simulation = shared.lock();
        shared.rebuild(&mut simulation);
        log::info!("[物理世界] 已重置");
    }

    /// 发射一个小球
    ///
    /// 场上小球数达到上限时先整体重置，再添加这一个。
    pub fn add_ball(&self, radius: f32, position: Vec3, velocity: Vec3) -> Result<()> {
        let shared = self.shared.as_deref().ok_or(PhantomError::WorldReleased)?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhantomError::InvalidPhysicsParameter(format!(
                "ball radius must be positive, got {radius}"
            )));
        }
        if !position.is_finite() || !velocity.is_finite() {
            return Err(PhantomError::InvalidPhysicsParameter(
                "ball position and velocity must be finite".to_string(),
            ));
        }

        let mut simulation = shared.lock();
        if simulation.ball_count() >= shared.config.ball_cap {
            log::debug!("[物理世界] 小球数达到上限 {}，重置", shared.config.ball_cap);
            shared.rebuild(&mut simulation);
        }
        simulation.add_ball(radius, position, velocity);
        shared.publish(&simulation);
        Ok(())
    }

    /// 推进 `dt` 秒并刷新小球变换；重置期间为空操作
    pub fn update(&self, dt: f32) {
        let Some(shared) = self.shared.as_deref() else {
            return;
        };
        let mut simulation = shared.lock();
        if !shared.running.load(Ordering::Acquire) {
            return;
        }
        if simulation.step(dt) > 0 {
            shared.publish(&simulation);
        }
    }

    /// 移动一只手的运动学碰撞体
    ///
    /// 只记录下一位置，在下一次 `update(dt > 0)` 的第一个子步中生效；
    /// 在此之前 [`hand_position`](Self::hand_position) 仍返回旧位置。
    pub fn move_hand(&self, side: Side, position: Vec3) {
        let Some(shared) = self.shared.as_deref() else {
            return;
        };
        if !position.is_finite() {
            log::debug!("[物理世界] 忽略非法手部位置 {:?}", position);
            return;
        }
        shared.lock().move_hand(side, position);
    }

    /// 手部碰撞体在最近一次步进后的位置
    pub fn hand_position(&self, side: Side) -> Option<Vec3> {
        self.shared.as_deref()?.lock().hand_position(side)
    }

    /// 小球世界变换快照（不加锁）
    pub fn ball_transforms(&self) -> Arc<Vec<Mat4>> {
        match self.shared.as_deref() {
            Some(shared) => shared.ball_transforms.load_full(),
            None => Arc::new(Vec::new()),
        }
    }

    /// 场上小球数
    pub fn ball_count(&self) -> usize {
        self.shared
            .as_deref()
            .map_or(0, |shared| shared.lock().ball_count())
    }
}

impl PartialEq for PhysicsWorld {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("valid", &self.is_valid())
            .field("balls", &self.ball_transforms().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(-10.0, 0.1).unwrap()
    }

    #[test]
    fn test_ball_cap_resets_before_adding() {
        let world = world();
        for i in 0..20 {
            world.add_ball(0.2, Vec3::new(i as f32, 5.0, 0.0), Vec3::ZERO).unwrap();
        }
        assert_eq!(world.ball_count(), 20);
        world.add_ball(0.2, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO).unwrap();
        assert_eq!(world.ball_count(), 1);
        assert_eq!(world.ball_transforms().len(), 1);
    }

    #[test]
    fn test_reset_clears_balls() {
        let world = world();
        world.add_ball(0.2, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO).unwrap();
        world.update(1.0 / 60.0);
        world.reset();
        assert!(world.ball_transforms().is_empty());
        world.update(1.0 / 60.0);
        assert!(world.ball_transforms().is_empty());
        assert!(world.is_running());
    }

    #[test]
    fn test_kinematic_hand_ignores_gravity() {
        let world = world();
        let target = Vec3::new(0.5, 3.0, -1.0);
        world.move_hand(Side::Left, target);
        world.update(1.0 / 60.0);
        let hand = world.hand_position(Side::Left).unwrap();
        assert!(hand.abs_diff_eq(target, 1e-5), "hand = {hand:?}");

        for _ in 0..30 {
            world.update(1.0 / 60.0);
        }
        let hand = world.hand_position(Side::Left).unwrap();
        assert!(hand.abs_diff_eq(target, 1e-5), "hand = {hand:?}");
        // 另一只手不受影响
        assert_eq!(world.hand_position(Side::Right), Some(Vec3::ZERO));
    }

    #[test]
    fn test_hand_move_applies_on_next_step() {
        let world = world();
        let target = Vec3::new(1.0, 2.0, 0.0);
        world.move_hand(Side::Right, target);
        assert_eq!(world.hand_position(Side::Right), Some(Vec3::ZERO));
        world.update(0.0);
        assert_eq!(world.hand_position(Side::Right), Some(Vec3::ZERO));
        world.update(1.0 / 60.0);
        let hand = world.hand_position(Side::Right).unwrap();
        assert!(hand.abs_diff_eq(target, 1e-5), "hand = {hand:?}");
    }

    #[test]
    fn test_ball_lands_on_hand() {
        let world = PhysicsWorld::new(-10.0, 0.5).unwrap();
        let hand = Vec3::new(0.0, 3.0, 0.0);
        world.move_hand(Side::Left, hand);
        world.update(1.0 / 60.0);

        world.add_ball(0.25, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO).unwrap();
        let mut lowest = f32::MAX;
        for _ in 0..60 {
            world.update(1.0 / 60.0);
            lowest = lowest.min(world.ball_transforms()[0].w_axis.y);
        }
        // 球心最低点应停在手球表面之上：3 + 0.5 + 0.25
        let resting = hand.y + 0.5 + 0.25;
        assert!(lowest > resting - 0.1, "lowest = {lowest}");
        assert!(lowest < resting + 0.05, "lowest = {lowest}");
    }

    #[test]
    fn test_ball_falls_but_stays_above_ground() {
        let world = world();
        let ground_top = world.config().unwrap().ground_top();
        world.add_ball(0.25, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO).unwrap();
        for _ in 0..100 {
            world.update(1.0 / 60.0);
        }
        let height = world.ball_transforms()[0].w_axis.y;
        assert!(height < 5.0, "height = {height}");
        assert!(height > ground_top, "height = {height}");
    }

    #[test]
    fn test_handles_share_one_world() {
        let world = world();
        let copy = world.clone();
        assert_eq!(world, copy);
        copy.add_ball(0.2, Vec3::Y, Vec3::ZERO).unwrap();
        assert_eq!(world.ball_count(), 1);
        assert_ne!(world, PhysicsWorld::new(-10.0, 0.1).unwrap());
    }

    #[test]
    fn test_released_handle_is_inert() {
        let mut world = world();
        let other = world.clone();
        world.release();
        assert!(!world.is_valid());
        assert!(matches!(
            world.add_ball(0.2, Vec3::Y, Vec3::ZERO),
            Err(PhantomError::WorldReleased)
        ));
        world.update(0.1);
        world.reset();
        assert!(world.ball_transforms().is_empty());
        assert!(world.hand_position(Side::Left).is_none());
        // 其它句柄仍然可用
        assert!(other.is_valid());
        other.add_ball(0.2, Vec3::Y, Vec3::ZERO).unwrap();
        assert_eq!(other.ball_count(), 1);
        assert!(!PhysicsWorld::default().is_valid());
    }

    #[test]
    fn test_invalid_construction_is_fatal() {
        assert!(PhysicsWorld::new(-10.0, -1.0).is_err());
        assert!(world().add_ball(0.0, Vec3::ZERO, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_concurrent_reset_and_update() {
        let world = world();
        let stepper = {
            let world = world.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    world.add_ball(0.2, Vec3::new(0.0, 5.0 + i as f32 * 0.01, 0.0), Vec3::ZERO).unwrap();
                    world.update(1.0 / 60.0);
                }
            })
        };
        for _ in 0..50 {
            world.reset();
            let transforms = world.ball_transforms();
            assert!(transforms.len() <= 20);
            assert!(transforms.iter().all(|m| m.is_finite()));
        }
        stepper.join().unwrap();
        assert!(world.ball_count() <= 20);
        assert!(world.is_running());
    }
}
