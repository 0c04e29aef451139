//! Sway 的核心库（`sway-core`）。
//!
//! 该 crate 维护 VR 手部碰撞体与动态骨骼链之间的多对多关联：
//! - 场景对象模型（[`scene`]）：节点树、碰撞体、三种动态骨骼链表示
//! - 统一的骨骼链适配器（[`adapter`]）
//! - 关联注册表（[`registry`]）：按每个碰撞体的选择谓词增量维护每条骨骼链的碰撞体列表
//! - 生命周期接入点（[`lifecycle`]）：骨骼注册入口与 VR 模式切换
//!
//! 注册表只管理**成员关系**，不做物理模拟。
//!
//! 大多数调用方只需要：
//! - 用 [`registry::SharedColliderRegistry`] 创建注册表并在各处共享
//! - 场景加载时调用 [`ColliderRegistry::register_dynamic_bone`]
//! - 通过 [`lifecycle::ModeManager`] 切换模式，由模式负责注册/清空手部碰撞体

pub mod adapter;
pub mod config;
pub mod lifecycle;
pub mod logger;
pub mod registry;
pub mod scene;

pub use adapter::{AdapterError, BoneAdapter, BoneChain, BoneKind, IntoBoneAdapter};
pub use registry::{ColliderRegistry, RegistryError, SharedColliderRegistry, TargetSelector};
