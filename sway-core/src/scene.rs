//! 场景对象模块。
//!
//! 注册表需要的宿主引擎对象的最小模型：
//! - [`transform`]：场景节点树（`Transform`）
//! - [`collider`]：碰撞体与骨骼链共享的碰撞体列表
//! - [`bone`]：三种动态骨骼链表示
//! - [`id`]：各类对象的身份标识

pub mod bone;
pub mod collider;
pub mod id;
pub mod transform;

pub use bone::{DynamicBone, DynamicBoneVer01, DynamicBoneVer02, Particle};
pub use collider::{Bound, ColliderList, ColliderShape, Direction, DynamicBoneCollider};
pub use id::{BoneId, ColliderId, NodeId};
pub use transform::{Ancestors, Descendants, HierarchyError, NodeNameError, Transform};
