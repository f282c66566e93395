//! 发球计时器

/// 按 `game/time` 间隔触发发球
#[derive(Debug, Clone)]
pub struct FireTimer {
    interval: f32,
    elapsed: f32,
    paused: bool,
}

impl FireTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            elapsed: 0.0,
            paused: false,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval.max(f32::EPSILON);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// 清零已累计的时间
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }

    /// 推进 `dt` 秒，到点时返回 true
    ///
    /// 每次最多触发一次；卡顿后积压的时间不会连续发球。
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.paused || !dt.is_finite() || dt <= 0.0 {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = (self.elapsed - self.interval) % self.interval;
            true
        } else {
            false
        }
    }
}
