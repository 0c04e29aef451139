//! 生命周期接入点。
//!
//! - [`ColliderRegistry::register_dynamic_bone`]：按骨骼链表示构造唯一的适配器并注册；
//! - [`VrMode`]：VR 模式的生命周期钩子（创建手柄 / 销毁）；
//! - [`StandingMode`] / [`SeatedMode`]：两种内置模式；
//! - [`ModeManager`]：模式切换，切换前先销毁旧模式（从而清空注册表）。

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::{
    adapter::{BoneAdapter, BoneKind, IntoBoneAdapter},
    config::SwayConfig,
    registry::{ColliderRegistry, RegistryError, SharedColliderRegistry},
    scene::{
        collider::{ColliderShape, DynamicBoneCollider},
        transform::Transform,
    },
};

impl ColliderRegistry {
    /// 注册任意一种骨骼链表示。
    ///
    /// 每次调用只为底层对象构造一个适配器，然后转交给 [`ColliderRegistry::register_bone`]。
    pub fn register_dynamic_bone<B: IntoBoneAdapter>(
        &mut self,
        bone: B,
    ) -> Result<(), RegistryError> {
        let adapter = bone.into_bone_adapter()?;
        self.register_bone(adapter)
    }
}

/// 骨骼链是否为胸部骨骼链：第二代表示且注释以 `prefix` 开头。
pub fn is_bust(adapter: &BoneAdapter, prefix: &str) -> bool {
    adapter.kind() == BoneKind::Ver02
        && adapter
            .comment()
            .is_some_and(|comment| comment.starts_with(prefix))
}

pub fn is_not_bust(adapter: &BoneAdapter, prefix: &str) -> bool {
    !is_bust(adapter, prefix)
}

/// VR 模式的生命周期钩子。
///
/// - `create_controllers`：左右手柄节点创建后调用一次。
/// - `on_destroy`：模式被替换或关闭时调用；实现应当清空注册表。
pub trait VrMode: Send {
    fn name(&self) -> &'static str;

    fn create_controllers(&mut self, left: &Transform, right: &Transform) -> anyhow::Result<()>;

    fn on_destroy(&mut self);
}

/// 站立模式：每个手柄挂载两个碰撞体，一个只作用于胸部骨骼链，另一个作用于其余骨骼链。
pub struct StandingMode {
    registry: SharedColliderRegistry,
    bust_shape: ColliderShape,
    hand_shape: ColliderShape,
    bust_prefix: Arc<str>,
    colliders: Vec<DynamicBoneCollider>,
}

impl StandingMode {
    pub fn new(registry: SharedColliderRegistry, config: &SwayConfig) -> Self {
        Self {
            registry,
            bust_shape: config.hand_colliders.bust.shape(),
            hand_shape: config.hand_colliders.hand.shape(),
            bust_prefix: Arc::from(config.bust_comment_prefix.as_str()),
            colliders: Vec::new(),
        }
    }

    /// 本模式创建的碰撞体（按创建顺序）。
    pub fn colliders(&self) -> &[DynamicBoneCollider] {
        &self.colliders
    }

    fn attach_colliders(&mut self, controller: &Transform) {
        let bust = DynamicBoneCollider::new(controller.clone(), self.bust_shape);
        let hand = DynamicBoneCollider::new(controller.clone(), self.hand_shape);

        let bust_prefix = Arc::clone(&self.bust_prefix);
        let hand_prefix = Arc::clone(&self.bust_prefix);
        self.registry.with(|registry| {
            registry.register_collider_with(bust.clone(), move |bone| {
                is_bust(bone, &bust_prefix)
            });
            registry.register_collider_with(hand.clone(), move |bone| {
                is_not_bust(bone, &hand_prefix)
            });
        });

        debug!(
            target: "sway-core",
            controller = %controller.name(),
            bust_collider = %bust.id().short(),
            hand_collider = %hand.id().short(),
            "attach controller colliders"
        );
        self.colliders.push(bust);
        self.colliders.push(hand);
    }
}

impl VrMode for StandingMode {
    fn name(&self) -> &'static str {
        "standing"
    }

    fn create_controllers(&mut self, left: &Transform, right: &Transform) -> anyhow::Result<()> {
        for controller in [left, right] {
            self.attach_colliders(controller);
        }
        Ok(())
    }

    fn on_destroy(&mut self) {
        info!(
            target: "sway-core",
            colliders = self.colliders.len(),
            "standing mode destroyed"
        );
        self.registry.with(ColliderRegistry::clear);
        self.colliders.clear();
    }
}

/// 坐姿模式：不挂载任何手部碰撞体。
pub struct SeatedMode {
    registry: SharedColliderRegistry,
}

impl SeatedMode {
    pub fn new(registry: SharedColliderRegistry) -> Self {
        Self { registry }
    }
}

impl VrMode for SeatedMode {
    fn name(&self) -> &'static str {
        "seated"
    }

    fn create_controllers(&mut self, _left: &Transform, _right: &Transform) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_destroy(&mut self) {
        self.registry.with(ColliderRegistry::clear);
    }
}

/// 当前 VR 模式的持有者。
///
/// 切换模式时先调用旧模式的 `on_destroy`，再为新模式创建手柄；被丢弃时同样会销毁当前模式。
pub struct ModeManager {
    left: Transform,
    right: Transform,
    current: Option<Box<dyn VrMode>>,
}

impl ModeManager {
    pub fn new(left: Transform, right: Transform) -> Self {
        Self {
            left,
            right,
            current: None,
        }
    }

    pub fn set_mode(&mut self, mut mode: Box<dyn VrMode>) -> anyhow::Result<()> {
        self.shutdown();
        mode.create_controllers(&self.left, &self.right)
            .with_context(|| format!("为 {} 模式创建手柄失败", mode.name()))?;
        info!(target: "sway-core", mode = mode.name(), "vr mode activated");
        self.current = Some(mode);
        Ok(())
    }

    /// 当前模式名称。
    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|mode| mode.name())
    }

    /// 销毁当前模式（若存在）。
    pub fn shutdown(&mut self) {
        if let Some(mut previous) = self.current.take() {
            previous.on_destroy();
        }
    }
}

impl Drop for ModeManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
