//! 捕获骨骼（深度相机人体跟踪）接口

use glam::Quat;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// 被跟踪的用户
#[derive(Clone, Debug, Default)]
pub struct TrackedUser {
    pub id: u32,
    tracked: bool,
    joints: HashMap<String, Quat>,
}

impl TrackedUser {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            tracked: false,
            joints: HashMap::new(),
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    pub fn set_tracked(&mut self, tracked: bool) {
        self.tracked = tracked;
    }

    /// 设置关节的局部旋转
    pub fn set_joint_rotation(&mut self, name: impl Into<String>, rotation: Quat) {
        self.joints.insert(name.into(), rotation);
    }

    /// 关节的局部旋转，未识别的关节返回 None
    pub fn joint_rotation(&self, name: &str) -> Option<Quat> {
        self.joints.get(name).copied()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

/// 骨骼跟踪器
///
/// 更新频率低且不规则，调用方每帧先 `update()` 再读取用户。
pub trait SkeletonTracker {
    /// 设备是否已就绪
    fn ready(&self) -> bool;

    /// 拉取最新的跟踪结果
    fn update(&mut self);

    /// 按 ID 获取用户
    fn user(&self, id: u32) -> Option<&TrackedUser>;
}

type PendingUsers = Arc<Mutex<Option<HashMap<u32, TrackedUser>>>>;

/// 传感器线程向 [`CaptureTracker`] 提交帧的句柄
#[derive(Clone)]
pub struct CaptureSender {
    pending: PendingUsers,
}

impl CaptureSender {
    /// 提交一整帧用户数据，覆盖尚未被读取的旧帧
    pub fn submit(&self, users: impl IntoIterator<Item = TrackedUser>) {
        let frame: HashMap<u32, TrackedUser> = users.into_iter().map(|u| (u.id, u)).collect();
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }
}

/// 内存中的跟踪器：传感器线程提交，渲染线程在 `update()` 时锁存
pub struct CaptureTracker {
    pending: PendingUsers,
    users: HashMap<u32, TrackedUser>,
    ready: bool,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(None)),
            users: HashMap::new(),
            ready: false,
        }
    }

    /// 创建提交句柄
    pub fn sender(&self) -> CaptureSender {
        CaptureSender {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl Default for CaptureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SkeletonTracker for CaptureTracker {
    fn ready(&self) -> bool {
        self.ready
            || self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
    }

    fn update(&mut self) {
        let frame = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(users) = frame {
            self.users = users;
            self.ready = true;
        }
    }

    fn user(&self, id: u32) -> Option<&TrackedUser> {
        self.users.get(&id)
    }
}
