//! 物理配置
//!
//! 所有参数扁平化，按值传入 [`PhysicsWorld`](super::PhysicsWorld)。

use crate::{PhantomError, Result};

/// 物理配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    // ========== 重力 ==========
    /// 重力 Y 分量（负数向下）
    pub gravity_y: f32,

    // ========== 手部 ==========
    /// 手部运动学球体半径
    pub hand_radius: f32,
    /// 手部弹性
    pub hand_restitution: f32,

    // ========== 小球 ==========
    /// 场上小球上限，达到后下一次发球先整体重置
    pub ball_cap: usize,
    /// 小球质量
    pub ball_mass: f32,
    /// 小球弹性
    pub ball_restitution: f32,

    // ========== 地面 ==========
    /// 地面盒子的半边长
    pub ground_half_extent: f32,
    /// 地面盒子中心的 Y 坐标（顶面 = 中心 + 半边长）
    pub ground_center_y: f32,

    // ========== 模拟参数 ==========
    /// 物理 FPS，决定单个子步的最大时长
    pub physics_fps: f32,
    /// 每次 update 最多的子步数
    pub max_substep_count: u32,
    /// 求解器迭代次数
    pub solver_iterations: usize,

    // ========== 调试 ==========
    /// 是否输出调试日志
    pub debug_log: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.8,

            hand_radius: 0.1,
            // 手要能把球拍出去
            hand_restitution: 0.6,

            ball_cap: 20,
            ball_mass: 1.0,
            ball_restitution: 0.4,

            // 足够大的盒子接住所有小球，顶面在 y = 0
            ground_half_extent: 50.0,
            ground_center_y: -50.0,

            physics_fps: 60.0,
            max_substep_count: 10,
            solver_iterations: 4,

            debug_log: false,
        }
    }
}

impl PhysicsConfig {
    pub fn new(gravity_y: f32, hand_radius: f32) -> Self {
        Self {
            gravity_y,
            hand_radius,
            ..Self::default()
        }
    }

    /// 地面顶面的高度
    pub fn ground_top(&self) -> f32 {
        self.ground_center_y + self.ground_half_extent
    }

    /// 单个子步的固定时长
    pub fn fixed_timestep(&self) -> f32 {
        1.0 / self.physics_fps
    }

    /// 检查参数，世界无法以这些参数运行时返回错误
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PhantomError::InvalidPhysicsParameter(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        }

        if !self.gravity_y.is_finite() {
            return Err(PhantomError::InvalidPhysicsParameter(format!(
                "gravity must be finite, got {}",
                self.gravity_y
            )));
        }
        if !self.ground_center_y.is_finite() {
            return Err(PhantomError::InvalidPhysicsParameter(
                "ground centre must be finite".to_string(),
            ));
        }
        positive("hand_radius", self.hand_radius)?;
        positive("ball_mass", self.ball_mass)?;
        positive("ground_half_extent", self.ground_half_extent)?;
        positive("physics_fps", self.physics_fps)?;
        if self.ball_cap == 0 {
            return Err(PhantomError::InvalidPhysicsParameter("ball_cap must be at least 1".to_string()));
        }
        if self.max_substep_count == 0 || self.solver_iterations == 0 {
            return Err(PhantomError::InvalidPhysicsParameter(
                "substep and solver iteration counts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
