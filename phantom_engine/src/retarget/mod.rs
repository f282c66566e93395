//! 手臂重定向：捕获骨骼 → 模型手臂骨骼 → 手部碰撞体位置

mod anchor;
mod arm_state;
mod engine;
pub mod frame;

pub use anchor::{HandAnchorProjector, HandAnchors};
pub use arm_state::{ArmBone, ArmState, Segment, SharedArmState, Side, SourceSelector};
pub use engine::{ArmRetargeter, RetargetOutcome, DEFAULT_USER_ID};
pub use frame::{ArmFrames, CorrectionFrame};
