//! 一次康复训练会话
//!
//! 每帧顺序：重定向 → 骨骼更新 → 手部投影 → 计时发球 → 物理步进。
//! 全部在调用 `update` 的线程上同步完成。

use glam::Vec3;

use super::launcher::FireTimer;
use super::settings::{GameSettings, SettingsProvider};
use super::spawn::{SpawnParams, SpawnPolicy};
use crate::physics::PhysicsWorld;
use crate::retarget::{ArmRetargeter, ArmState, HandAnchorProjector, HandAnchors, RetargetOutcome, SharedArmState};
use crate::skeleton::{SkeletonTracker, TargetSkeleton};
use crate::Result;

/// 一帧的执行结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub retarget: RetargetOutcome,
    pub hands_moved: usize,
    pub fired: Option<SpawnParams>,
}

/// 训练会话：持有跟踪器、模型骨骼和物理世界
pub struct RehabSession<T, S>
where
    T: SkeletonTracker,
    S: TargetSkeleton,
{
    tracker: T,
    skeleton: S,
    retargeter: ArmRetargeter,
    projector: HandAnchorProjector,
    physics: PhysicsWorld,
    spawner: SpawnPolicy,
    timer: FireTimer,
    arm_state: SharedArmState,
    settings: GameSettings,
    /// 左右两侧是否已按手部碰撞体校准
    sides_aligned: bool,
}

impl<T, S> RehabSession<T, S>
where
    T: SkeletonTracker,
    S: TargetSkeleton,
{
    pub fn new(tracker: T, skeleton: S, settings: GameSettings, anchors: HandAnchors) -> Result<Self> {
        settings.validate()?;
        let physics = PhysicsWorld::with_config(settings.physics_config())?;

        Ok(Self {
            tracker,
            skeleton,
            retargeter: ArmRetargeter::new(),
            projector: HandAnchorProjector::new(anchors),
            physics,
            spawner: SpawnPolicy::from_entropy(settings.spawn_tuning()),
            timer: FireTimer::new(settings.fire_interval),
            arm_state: SharedArmState::default(),
            settings,
            sides_aligned: false,
        })
    }

    /// 用固定种子的发球器替换默认发球器
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.spawner = SpawnPolicy::new(self.settings.spawn_tuning(), seed);
        self
    }

    pub fn with_retargeter(mut self, retargeter: ArmRetargeter) -> Self {
        self.retargeter = retargeter;
        self
    }

    pub fn with_projector(mut self, projector: HandAnchorProjector) -> Self {
        self.projector = projector;
        self
    }

    /// 供界面回调捕获的手臂模式句柄
    pub fn arm_state_handle(&self) -> SharedArmState {
        self.arm_state.clone()
    }

    pub fn arm_state(&self) -> ArmState {
        self.arm_state.get()
    }

    pub fn set_arm_state(&self, state: ArmState) {
        self.arm_state.set(state);
        log::info!("[会话] 手臂模式切换为 {}", state);
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn skeleton(&self) -> &S {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut S {
        &mut self.skeleton
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// 开始 / 暂停自动发球
    pub fn set_spawning(&mut self, enabled: bool) {
        self.timer.set_paused(!enabled);
    }

    pub fn is_spawning(&self) -> bool {
        !self.timer.is_paused()
    }

    /// 执行一帧
    pub fn update(&mut self, dt: f32) -> FrameReport {
        let state = self.arm_state.get();
        let retarget = self
            .retargeter
            .retarget_frame(&mut self.tracker, &mut self.skeleton, state);
        self.skeleton.update();

        let hands_moved = self.projector.project_hands(&self.skeleton, &self.physics);

        let fired = if self.timer.tick(dt) {
            match self.spawner.fire_ball(&self.physics, state) {
                Ok(params) => Some(params),
                Err(e) => {
                    log::warn!("[会话] 发球失败: {}", e);
                    None
                }
            }
        } else {
            None
        };

        self.physics.update(dt);
        if !self.sides_aligned {
            self.sides_aligned = self.align_spawn_sides();
        }

        FrameReport {
            retarget,
            hands_moved,
            fired,
        }
    }

    /// 立即发一个球
    pub fn fire_ball(&mut self) -> Result<SpawnParams> {
        self.spawner.fire_ball(&self.physics, self.arm_state.get())
    }

    /// 清空小球并重新计时
    pub fn reset(&mut self) {
        self.physics.reset();
        self.timer.restart();
    }

    pub fn set_speed_factor(&mut self, speed_factor: f32) {
        if speed_factor.is_finite() {
            self.settings.speed_factor = speed_factor;
            self.spawner.tuning_mut().speed_factor = speed_factor;
        }
    }

    pub fn set_spawn_width(&mut self, width: f32) {
        if width.is_finite() {
            let width = width.max(0.0);
            self.settings.width = width;
            self.spawner.tuning_mut().width = width;
        }
    }

    /// 按两只手碰撞体的当前位置确定左手在哪一侧，供强调发球使用
    ///
    /// `update` 在两手第一次分开后自动调用一次；在此之前使用设置中的
    /// `game/left/xsign`。两手 X 坐标相同时无法判断，保持原设置并返回 false。
    pub fn align_spawn_sides(&mut self) -> bool {
        let [Some(left), Some(right)] = self.hand_positions() else {
            return false;
        };
        let dx = left.x - right.x;
        if dx.abs() < 1e-4 {
            return false;
        }
        let sign = dx.signum();
        self.settings.left_x_sign = sign;
        self.spawner.tuning_mut().left_x_sign = sign;
        log::info!("[会话] 左手位于 X{}侧", if sign > 0.0 { "+" } else { "-" });
        true
    }

    /// 当前手部碰撞体位置（左、右）
    pub fn hand_positions(&self) -> [Option<Vec3>; 2] {
        [
            self.physics.hand_position(crate::retarget::Side::Left),
            self.physics.hand_position(crate::retarget::Side::Right),
        ]
    }

    /// 结束会话，写回可调参数
    pub fn shutdown(self, provider: &mut dyn SettingsProvider) {
        self.settings.store_tunables(provider);
        log::info!(
            "[会话] 结束: speed/factor={}, width={}",
            self.settings.speed_factor, self.settings.width
        );
    }
}
