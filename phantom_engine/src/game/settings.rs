//! 游戏设置
//!
//! 设置文件的读取在外部完成；本模块只依赖按字符串键查询的 [`SettingsProvider`]。

use std::collections::HashMap;

use super::spawn::SpawnTuning;
use crate::physics::PhysicsConfig;
use crate::{PhantomError, Result};

/// 设置键
pub mod keys {
    pub const GRAVITY: &str = "game/gravity";
    pub const HAND_RADIUS: &str = "game/hand_radius";
    pub const WIDTH: &str = "game/width";
    pub const SPEED_MIN: &str = "game/speed/min";
    pub const SPEED_FACTOR: &str = "game/speed/factor";
    pub const HEIGHT_MIN: &str = "game/height/min";
    pub const HEIGHT_FACTOR: &str = "game/height/factor";
    pub const TIME: &str = "game/time";
    pub const EMPHASIS: &str = "game/emphasis";

    // 可选，缺省时取默认值
    pub const BALL_RADIUS: &str = "game/ball/radius";
    pub const DISTANCE: &str = "game/distance";
    pub const LIFT_MIN: &str = "game/lift/min";
    pub const LIFT_FACTOR: &str = "game/lift/factor";
    pub const BALL_CAP: &str = "game/ball/cap";
    pub const SUBSTEPS: &str = "game/substeps";
    pub const LEFT_X_SIGN: &str = "game/left/xsign";
}

/// 设置值
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Float(f32),
    Bool(bool),
    Text(String),
}

impl SettingValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            SettingValue::Float(v) => Some(*v),
            SettingValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            SettingValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Float(v) => Some(*v != 0.0),
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<f32> for SettingValue {
    fn from(v: f32) -> Self {
        SettingValue::Float(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v as f32)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

/// 按字符串键读写设置
pub trait SettingsProvider {
    fn get(&self, key: &str) -> Option<SettingValue>;
    fn set(&mut self, key: &str, value: SettingValue);
}

/// 内存中的设置表
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, SettingValue>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsProvider for MapSettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: SettingValue) {
        self.values.insert(key.to_string(), value);
    }
}

/// 接球游戏的全部可调参数
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub gravity: f32,
    pub hand_radius: f32,
    /// 发球区宽度
    pub width: f32,
    pub speed_min: f32,
    pub speed_factor: f32,
    pub height_min: f32,
    pub height_factor: f32,
    /// 发球间隔（秒）
    pub fire_interval: f32,
    /// 是否把发球区偏向被替代的手臂
    pub emphasis: bool,
    pub ball_radius: f32,
    /// 发球点到玩家的距离
    pub distance: f32,
    pub lift_min: f32,
    pub lift_factor: f32,
    pub ball_cap: usize,
    pub max_substeps: u32,
    /// 玩家左手在世界 X 轴上的一侧（+1 或 -1）
    pub left_x_sign: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            hand_radius: 0.1,
            width: 4.0,
            speed_min: 4.0,
            speed_factor: 2.0,
            height_min: 1.0,
            height_factor: 1.0,
            fire_interval: 2.0,
            emphasis: false,
            ball_radius: 0.5,
            distance: 20.0,
            lift_min: 1.0,
            lift_factor: 1.0,
            ball_cap: 20,
            max_substeps: 10,
            left_x_sign: -1.0,
        }
    }
}

fn required_f32(provider: &dyn SettingsProvider, key: &str) -> Result<f32> {
    let value = provider
        .get(key)
        .ok_or_else(|| PhantomError::MissingSetting(key.to_string()))?;
    value.as_f32().ok_or_else(|| PhantomError::InvalidSetting {
        key: key.to_string(),
        reason: format!("expected a number, got {value:?}"),
    })
}

fn required_bool(provider: &dyn SettingsProvider, key: &str) -> Result<bool> {
    let value = provider
        .get(key)
        .ok_or_else(|| PhantomError::MissingSetting(key.to_string()))?;
    value.as_bool().ok_or_else(|| PhantomError::InvalidSetting {
        key: key.to_string(),
        reason: format!("expected a boolean, got {value:?}"),
    })
}

fn optional_f32(provider: &dyn SettingsProvider, key: &str, default: f32) -> Result<f32> {
    match provider.get(key) {
        Some(_) => required_f32(provider, key),
        None => Ok(default),
    }
}

fn check(key: &str, ok: bool, reason: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(PhantomError::InvalidSetting {
            key: key.to_string(),
            reason: reason.to_string(),
        })
    }
}

impl GameSettings {
    /// 从设置源读取；九个基本键必须存在，其余键可选
    pub fn load(provider: &dyn SettingsProvider) -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            gravity: required_f32(provider, keys::GRAVITY)?,
            hand_radius: required_f32(provider, keys::HAND_RADIUS)?,
            width: required_f32(provider, keys::WIDTH)?,
            speed_min: required_f32(provider, keys::SPEED_MIN)?,
            speed_factor: required_f32(provider, keys::SPEED_FACTOR)?,
            height_min: required_f32(provider, keys::HEIGHT_MIN)?,
            height_factor: required_f32(provider, keys::HEIGHT_FACTOR)?,
            fire_interval: required_f32(provider, keys::TIME)?,
            emphasis: required_bool(provider, keys::EMPHASIS)?,
            ball_radius: optional_f32(provider, keys::BALL_RADIUS, defaults.ball_radius)?,
            distance: optional_f32(provider, keys::DISTANCE, defaults.distance)?,
            lift_min: optional_f32(provider, keys::LIFT_MIN, defaults.lift_min)?,
            lift_factor: optional_f32(provider, keys::LIFT_FACTOR, defaults.lift_factor)?,
            ball_cap: optional_f32(provider, keys::BALL_CAP, defaults.ball_cap as f32)? as usize,
            max_substeps: optional_f32(provider, keys::SUBSTEPS, defaults.max_substeps as f32)? as u32,
            left_x_sign: optional_f32(provider, keys::LEFT_X_SIGN, defaults.left_x_sign)?,
        };
        settings.validate()?;

        log::info!(
            "[设置] 重力={}, 手半径={}, 发球宽度={}, 发球间隔={}s, 强调={}",
            settings.gravity, settings.hand_radius, settings.width, settings.fire_interval, settings.emphasis
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = [
            self.gravity,
            self.hand_radius,
            self.width,
            self.speed_min,
            self.speed_factor,
            self.height_min,
            self.height_factor,
            self.fire_interval,
            self.ball_radius,
            self.distance,
            self.lift_min,
            self.lift_factor,
        ]
        .iter()
        .all(|v| v.is_finite());
        check("game", all_finite, "all values must be finite")?;
        check(keys::HAND_RADIUS, self.hand_radius > 0.0, "must be positive")?;
        check(keys::TIME, self.fire_interval > 0.0, "must be positive")?;
        check(keys::WIDTH, self.width >= 0.0, "must not be negative")?;
        check(keys::BALL_RADIUS, self.ball_radius > 0.0, "must be positive")?;
        check(keys::BALL_CAP, self.ball_cap > 0, "must be at least 1")?;
        check(keys::LEFT_X_SIGN, self.left_x_sign.abs() == 1.0, "must be 1 or -1")?;
        check(keys::SUBSTEPS, self.max_substeps > 0, "must be at least 1")?;
        Ok(())
    }

    /// 退出时写回可调参数
    pub fn store_tunables(&self, provider: &mut dyn SettingsProvider) {
        provider.set(keys::SPEED_FACTOR, SettingValue::Float(self.speed_factor));
        provider.set(keys::WIDTH, SettingValue::Float(self.width));
    }

    pub fn physics_config(&self) -> PhysicsConfig {
        PhysicsConfig {
            gravity_y: self.gravity,
            hand_radius: self.hand_radius,
            ball_cap: self.ball_cap,
            max_substep_count: self.max_substeps,
            ..PhysicsConfig::default()
        }
    }

    pub fn spawn_tuning(&self) -> SpawnTuning {
        SpawnTuning {
            ball_radius: self.ball_radius,
            width: self.width,
            height_min: self.height_min,
            height_factor: self.height_factor,
            speed_min: self.speed_min,
            speed_factor: self.speed_factor,
            lift_min: self.lift_min,
            lift_factor: self.lift_factor,
            distance: self.distance,
            emphasis: self.emphasis,
            left_x_sign: self.left_x_sign,
        }
    }
}

#[cfg(test)]
pub(crate) fn base_settings() -> MapSettings {
    MapSettings::new()
        .with(keys::GRAVITY, -10.0)
        .with(keys::HAND_RADIUS, 0.1)
        .with(keys::WIDTH, 4.0)
        .with(keys::SPEED_MIN, 4.0)
        .with(keys::SPEED_FACTOR, 2.0)
        .with(keys::HEIGHT_MIN, 1.0)
        .with(keys::HEIGHT_FACTOR, 0.5)
        .with(keys::TIME, 1.5)
        .with(keys::EMPHASIS, "false")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_defaults_for_optional_keys() {
        let settings = GameSettings::load(&base_settings()).unwrap();
        assert_eq!(settings.gravity, -10.0);
        assert_eq!(settings.fire_interval, 1.5);
        assert!(!settings.emphasis);
        assert_eq!(settings.ball_cap, 20);
        assert_eq!(settings.ball_radius, GameSettings::default().ball_radius);
        assert_eq!(settings.left_x_sign, -1.0);
        assert_eq!(settings.spawn_tuning().left_x_sign, -1.0);
    }

    #[test]
    fn test_text_values_are_converted() {
        let provider = base_settings()
            .with(keys::WIDTH, " 2.5 ")
            .with(keys::EMPHASIS, "TRUE")
            .with(keys::BALL_CAP, "12");
        let settings = GameSettings::load(&provider).unwrap();
        assert_eq!(settings.width, 2.5);
        assert!(settings.emphasis);
        assert_eq!(settings.ball_cap, 12);
        assert_eq!(settings.physics_config().ball_cap, 12);
    }

    #[test]
    fn test_missing_and_invalid_keys() {
        let mut provider = base_settings();
        provider.values.remove(keys::GRAVITY);
        assert!(matches!(
            GameSettings::load(&provider),
            Err(PhantomError::MissingSetting(key)) if key == keys::GRAVITY
        ));

        let provider = base_settings().with(keys::SPEED_MIN, "fast");
        assert!(matches!(GameSettings::load(&provider), Err(PhantomError::InvalidSetting { .. })));

        let provider = base_settings().with(keys::HAND_RADIUS, 0.0);
        assert!(matches!(GameSettings::load(&provider), Err(PhantomError::InvalidSetting { .. })));

        let provider = base_settings().with(keys::LEFT_X_SIGN, 0.5);
        assert!(matches!(
            GameSettings::load(&provider),
            Err(PhantomError::InvalidSetting { key, .. }) if key == keys::LEFT_X_SIGN
        ));
    }

    #[test]
    fn test_store_tunables_writes_two_keys() {
        let mut settings = GameSettings::load(&base_settings()).unwrap();
        settings.speed_factor = 3.5;
        settings.width = 6.0;
        let mut out = MapSettings::new();
        settings.store_tunables(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(keys::SPEED_FACTOR), Some(SettingValue::Float(3.5)));
        assert_eq!(out.get(keys::WIDTH), Some(SettingValue::Float(6.0)));
    }
}
