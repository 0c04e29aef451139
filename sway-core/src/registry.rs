//! 动态碰撞体关联注册表。
//!
//! 注册表维护两组对象：带选择谓词的碰撞体，以及已注册的骨骼链适配器。每当其中一侧新增成员，
//! 就只对另一侧做一次增量关联，使得每条骨骼链的碰撞体列表与每个碰撞体的谓词保持一致：
//!
//! 任意一次注册调用结束后，对任意已注册的碰撞体 C 与骨骼链 A，
//! `C ∈ A.colliders()` 当且仅当 `selector(C)(A)` 为真。
//!
//! 谓词在注册时求值；注册表不会自发地重新求值（需要时显式调用 [`ColliderRegistry::recorrelate`]）。
//!
//! 碰撞体列表归模拟对象所有，注册表只借用写权限；[`ColliderRegistry::clear`] 不会改动任何列表。

use std::{fmt, ops::Deref, sync::Arc};

use indexmap::IndexMap;
use nalgebra::Vector3;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::{
    adapter::{AdapterError, BoneAdapter},
    scene::{
        collider::DynamicBoneCollider,
        id::{BoneId, ColliderId},
    },
};

/// 碰撞体的选择谓词：决定某条骨骼链是否应当受该碰撞体影响。
pub type TargetSelector = Arc<dyn Fn(&BoneAdapter) -> bool + Send + Sync>;

/// 默认谓词：对任何骨骼链都成立。
pub fn always() -> TargetSelector {
    Arc::new(|_| true)
}

struct ColliderEntry {
    collider: DynamicBoneCollider,
    selector: TargetSelector,
}

/// 单次关联的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Correlation {
    Inserted,
    Removed,
    Unchanged,
}

/// 碰撞体与骨骼链之间多对多关系的注册表。
///
/// 注册表本身不是全局状态：由调用方持有并按引用传递；跨线程使用时请包一层
/// [`SharedColliderRegistry`]，让所有操作串行化。
#[derive(Default)]
pub struct ColliderRegistry {
    colliders: IndexMap<ColliderId, ColliderEntry>,
    bones: Vec<BoneAdapter>,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以默认谓词（对所有骨骼链成立）注册碰撞体。
    pub fn register_collider(&mut self, collider: DynamicBoneCollider) {
        self.register_collider_selector(collider, always());
    }

    /// 以自定义谓词注册碰撞体。
    pub fn register_collider_with<F>(&mut self, collider: DynamicBoneCollider, selector: F)
    where
        F: Fn(&BoneAdapter) -> bool + Send + Sync + 'static,
    {
        self.register_collider_selector(collider, Arc::new(selector));
    }

    /// 注册（或覆盖）碰撞体及其谓词，然后与每一条已注册的骨骼链做关联。
    ///
    /// 同一个碰撞体重复注册时，新谓词替换旧谓词，结果只反映新谓词。
    pub fn register_collider_selector(
        &mut self,
        collider: DynamicBoneCollider,
        selector: TargetSelector,
    ) {
        let id = collider.id();
        let replaced = self
            .colliders
            .insert(
                id,
                ColliderEntry {
                    collider: collider.clone(),
                    selector: Arc::clone(&selector),
                },
            )
            .is_some();

        debug!(
            target: "sway-core",
            collider_id = %id.short(),
            anchor = %collider.anchor().name(),
            replaced,
            bones = self.bones.len(),
            "register collider"
        );

        for bone in &self.bones {
            Self::correlate(bone, &collider, &selector);
        }
    }

    /// 注册一条骨骼链，然后与每一个已注册的碰撞体做关联。
    ///
    /// 同一个底层模拟对象不能作为两条独立记录注册两次：重复注册会被拒绝，注册表与所有列表保持不变。
    pub fn register_bone(&mut self, adapter: BoneAdapter) -> Result<(), RegistryError> {
        if self.contains_bone(adapter.id()) {
            warn!(
                target: "sway-core",
                bone_id = %adapter.id().short(),
                kind = %adapter.kind(),
                "bone chain is already registered, ignoring duplicate"
            );
            return Err(RegistryError::DuplicateBone(adapter.id()));
        }

        debug!(
            target: "sway-core",
            bone_id = %adapter.id().short(),
            kind = %adapter.kind(),
            root = %adapter.root().name(),
            colliders = self.colliders.len(),
            "register bone"
        );

        for entry in self.colliders.values() {
            Self::correlate(&adapter, &entry.collider, &entry.selector);
        }
        self.bones.push(adapter);
        Ok(())
    }

    /// 注销一个碰撞体，并把它从每一条已注册骨骼链的列表中移除。
    pub fn unregister_collider(
        &mut self,
        id: ColliderId,
    ) -> Result<DynamicBoneCollider, RegistryError> {
        let entry = self
            .colliders
            .shift_remove(&id)
            .ok_or(RegistryError::ColliderNotFound(id))?;

        let swept = self
            .bones
            .iter()
            .filter(|bone| bone.colliders().remove(&entry.collider))
            .count();
        debug!(
            target: "sway-core",
            collider_id = %id.short(),
            swept,
            "unregister collider"
        );

        Ok(entry.collider)
    }

    /// 注销一条骨骼链，并从它的列表中移除所有已注册的碰撞体。
    pub fn unregister_bone(&mut self, id: BoneId) -> Result<BoneAdapter, RegistryError> {
        let index = self
            .bones
            .iter()
            .position(|bone| bone.id() == id)
            .ok_or(RegistryError::BoneNotFound(id))?;
        let adapter = self.bones.remove(index);

        for entry in self.colliders.values() {
            adapter.colliders().remove(&entry.collider);
        }
        debug!(
            target: "sway-core",
            bone_id = %id.short(),
            "unregister bone"
        );

        Ok(adapter)
    }

    /// 用当前谓词重新评估每一对（碰撞体，骨骼链）。
    ///
    /// 谓词可能读取外部可变状态；外部状态改变后由调用方显式触发。
    pub fn recorrelate(&mut self) {
        for bone in &self.bones {
            for entry in self.colliders.values() {
                Self::correlate(bone, &entry.collider, &entry.selector);
            }
        }
    }

    /// 丢弃全部注册信息。
    ///
    /// 不会修改任何骨骼链的碰撞体列表：列表中已有的碰撞体会保留，由其所有者负责清理。
    pub fn clear(&mut self) {
        if self.is_empty() {
            trace!(target: "sway-core", "clear on empty registry");
            return;
        }
        info!(
            target: "sway-core",
            colliders = self.colliders.len(),
            bones = self.bones.len(),
            "clear collider registry"
        );
        self.colliders.clear();
        self.bones.clear();
    }

    /// 查询碰撞体当前的谓词。
    pub fn target_selector(&self, id: ColliderId) -> Result<TargetSelector, RegistryError> {
        self.colliders
            .get(&id)
            .map(|entry| Arc::clone(&entry.selector))
            .ok_or(RegistryError::ColliderNotFound(id))
    }

    /// 已注册骨骼链的只读视图。
    pub fn bones(&self) -> &[BoneAdapter] {
        &self.bones
    }

    /// 已注册的碰撞体（按注册顺序）。
    pub fn colliders(&self) -> impl Iterator<Item = &DynamicBoneCollider> {
        self.colliders.values().map(|entry| &entry.collider)
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn contains_collider(&self, id: ColliderId) -> bool {
        self.colliders.contains_key(&id)
    }

    pub fn contains_bone(&self, id: BoneId) -> bool {
        self.bones.iter().any(|bone| bone.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty() && self.bones.is_empty()
    }

    /// 末端节点离 `point` 最近的骨骼链。
    pub fn nearest_bone(&self, point: &Vector3<f32>) -> Option<&BoneAdapter> {
        self.bones
            .iter()
            .map(|bone| (bone, (bone.terminal().world_position() - point).norm()))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(bone, _)| bone)
    }

    fn correlate(
        bone: &BoneAdapter,
        collider: &DynamicBoneCollider,
        selector: &TargetSelector,
    ) -> Correlation {
        let outcome = if selector(bone) {
            if bone.colliders().insert_unique(collider) {
                Correlation::Inserted
            } else {
                Correlation::Unchanged
            }
        } else if bone.colliders().remove(collider) {
            Correlation::Removed
        } else {
            Correlation::Unchanged
        };

        match outcome {
            Correlation::Unchanged => trace!(
                target: "sway-core",
                collider_id = %collider.id().short(),
                bone_id = %bone.id().short(),
                "correlation unchanged"
            ),
            _ => debug!(
                target: "sway-core",
                collider_id = %collider.id().short(),
                bone_id = %bone.id().short(),
                ?outcome,
                "correlate"
            ),
        }
        outcome
    }
}

impl fmt::Debug for ColliderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let colliders: Vec<String> = self.colliders.keys().map(|id| id.short()).collect();
        f.debug_struct("ColliderRegistry")
            .field("colliders", &colliders)
            .field("bones", &self.bones)
            .finish()
    }
}

/// 可跨线程共享的注册表句柄。
///
/// 两种注册操作都会在遍历一侧集合的同时修改骨骼链的共享列表；所有操作必须经过同一把锁串行化。
#[derive(Clone, Default)]
pub struct SharedColliderRegistry(Arc<Mutex<ColliderRegistry>>);

impl SharedColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在持锁状态下执行一次操作。
    pub fn with<R>(&self, f: impl FnOnce(&mut ColliderRegistry) -> R) -> R {
        let mut registry = self.0.lock();
        f(&mut registry)
    }
}

impl fmt::Debug for SharedColliderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedColliderRegistry").finish()
    }
}

impl Deref for SharedColliderRegistry {
    type Target = Mutex<ColliderRegistry>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// 注册表操作的错误类型。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 碰撞体从未注册，或已被清空/注销。
    #[error("碰撞体 {0} 未注册")]
    ColliderNotFound(ColliderId),
    #[error("骨骼链 {0} 未注册")]
    BoneNotFound(BoneId),
    /// 同一个底层模拟对象被重复注册。
    #[error("骨骼链 {0} 已经注册过")]
    DuplicateBone(BoneId),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
