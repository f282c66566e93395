//! 接球游戏物理系统
//!
//! 使用 Rapier3D 物理引擎实现。
//!
//! ## 对应关系
//! | Bullet3 | Rapier |
//! |---------|--------|
//! | btDiscreteDynamicsWorld | PhysicsPipeline + RigidBodySet + ColliderSet |
//! | btDbvtBroadphase | DefaultBroadPhase |
//! | btSphereShape | ColliderBuilder::ball() |
//! | btBoxShape | ColliderBuilder::cuboid() |
//! | CF_KINEMATIC_OBJECT + DISABLE_DEACTIVATION | kinematic_position_based + can_sleep(false) |

pub mod config;
mod convert;
mod simulation;
mod world;

pub use config::PhysicsConfig;
pub use convert::{isometry_to_mat4, rapier_to_vec3, vec3_to_rapier};
pub use world::PhysicsWorld;
