//! 骨骼链适配器。
//!
//! 三种骨骼链表示的结构互不兼容，注册表却需要一个统一的视图。[`BoneChain`] 定义这组能力
//! （根节点、末端节点、全部节点、可变碰撞体列表），每种表示各自实现一次；
//! [`BoneAdapter`] 在构造时选定实现，之后共享逻辑里不再做任何类型判断。

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use thiserror::Error;

use crate::scene::{
    bone::{DynamicBone, DynamicBoneVer01, DynamicBoneVer02},
    collider::ColliderList,
    id::BoneId,
    transform::Transform,
};

/// 骨骼链的具体表示类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoneKind {
    Classic,
    Ver01,
    Ver02,
}

impl fmt::Display for BoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BoneKind::Classic => "DynamicBone",
            BoneKind::Ver01 => "DynamicBoneVer01",
            BoneKind::Ver02 => "DynamicBoneVer02",
        };
        f.write_str(label)
    }
}

/// 骨骼链能力集。
///
/// 实现者是宿主的模拟对象本身；[`BoneChain::colliders`] 必须返回模拟对象**自己的**列表句柄，
/// 而不是快照。
pub trait BoneChain: Send + Sync + 'static {
    /// 底层模拟对象的身份。
    fn id(&self) -> BoneId;

    fn kind(&self) -> BoneKind;

    fn root(&self) -> Option<&Transform>;

    /// 链上离根节点最远的一端。
    fn terminal(&self) -> Option<Transform>;

    /// 覆盖链上全部节点（含根节点）的惰性序列；顺序由实现决定但保持稳定。
    fn nodes(&self) -> Box<dyn Iterator<Item = Transform> + '_>;

    fn colliders(&self) -> &ColliderList;

    /// 附在模拟对象上的文本注释（用于区分身体部位）。
    fn comment(&self) -> Option<&str> {
        None
    }

    /// 构造适配器前的前置条件检查。
    fn validate(&self) -> Result<(), AdapterError> {
        if self.root().is_none() {
            return Err(AdapterError::MissingRoot {
                bone: self.id(),
                kind: self.kind(),
            });
        }
        Ok(())
    }
}

impl BoneChain for DynamicBone {
    fn id(&self) -> BoneId {
        DynamicBone::id(self)
    }

    fn kind(&self) -> BoneKind {
        BoneKind::Classic
    }

    fn root(&self) -> Option<&Transform> {
        DynamicBone::root(self)
    }

    /// 根节点层级中深度优先先序的最后一个后代；没有后代时就是根节点本身。
    fn terminal(&self) -> Option<Transform> {
        let root = DynamicBone::root(self)?;
        root.descendants().last().or_else(|| Some(root.clone()))
    }

    /// 先列出全部后代，最后是根节点。
    fn nodes(&self) -> Box<dyn Iterator<Item = Transform> + '_> {
        match DynamicBone::root(self) {
            Some(root) => Box::new(root.descendants().chain(std::iter::once(root.clone()))),
            None => Box::new(std::iter::empty()),
        }
    }

    fn colliders(&self) -> &ColliderList {
        DynamicBone::colliders(self)
    }
}

/// 显式节点列表必须包含根节点，否则 `nodes()` 会漏掉根节点。
fn ensure_root_in_chain<B: BoneChain>(bone: &B) -> Result<(), AdapterError> {
    let Some(root) = bone.root() else {
        return Err(AdapterError::MissingRoot {
            bone: bone.id(),
            kind: bone.kind(),
        });
    };
    if bone.nodes().any(|node| &node == root) {
        Ok(())
    } else {
        Err(AdapterError::RootNotInChain {
            bone: bone.id(),
            kind: bone.kind(),
            root: root.name(),
        })
    }
}

impl BoneChain for DynamicBoneVer01 {
    fn id(&self) -> BoneId {
        DynamicBoneVer01::id(self)
    }

    fn kind(&self) -> BoneKind {
        BoneKind::Ver01
    }

    fn root(&self) -> Option<&Transform> {
        DynamicBoneVer01::root(self)
    }

    fn terminal(&self) -> Option<Transform> {
        self.particles()
            .last()
            .map(|particle| particle.transform().clone())
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = Transform> + '_> {
        Box::new(
            self.particles()
                .iter()
                .map(|particle| particle.transform().clone()),
        )
    }

    fn colliders(&self) -> &ColliderList {
        DynamicBoneVer01::colliders(self)
    }

    fn validate(&self) -> Result<(), AdapterError> {
        if DynamicBoneVer01::root(self).is_none() {
            return Err(AdapterError::MissingRoot {
                bone: self.id(),
                kind: BoneKind::Ver01,
            });
        }
        if self.particles().is_empty() {
            return Err(AdapterError::EmptyChain {
                bone: self.id(),
                kind: BoneKind::Ver01,
            });
        }
        ensure_root_in_chain(self)
    }
}

impl BoneChain for DynamicBoneVer02 {
    fn id(&self) -> BoneId {
        DynamicBoneVer02::id(self)
    }

    fn kind(&self) -> BoneKind {
        BoneKind::Ver02
    }

    fn root(&self) -> Option<&Transform> {
        DynamicBoneVer02::root(self)
    }

    fn terminal(&self) -> Option<Transform> {
        self.bones().last().cloned()
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = Transform> + '_> {
        Box::new(self.bones().iter().cloned())
    }

    fn colliders(&self) -> &ColliderList {
        DynamicBoneVer02::colliders(self)
    }

    fn comment(&self) -> Option<&str> {
        DynamicBoneVer02::comment(self)
    }

    fn validate(&self) -> Result<(), AdapterError> {
        if DynamicBoneVer02::root(self).is_none() {
            return Err(AdapterError::MissingRoot {
                bone: self.id(),
                kind: BoneKind::Ver02,
            });
        }
        if self.bones().is_empty() {
            return Err(AdapterError::EmptyChain {
                bone: self.id(),
                kind: BoneKind::Ver02,
            });
        }
        ensure_root_in_chain(self)
    }
}

/// 统一的骨骼链视图。
///
/// - 每个底层模拟对象对应一个适配器；两个包装同一对象的适配器相等。
/// - [`BoneAdapter::colliders`] 是模拟对象碰撞体列表的活句柄，修改立即影响模拟。
/// - 适配器不拥有模拟对象的生命周期；它只持有一个共享引用。
#[derive(Clone)]
pub struct BoneAdapter {
    chain: Arc<dyn BoneChain>,
    root: Transform,
}

impl BoneAdapter {
    /// 包装一个骨骼链。
    ///
    /// 缺少根节点、显式节点列表为空或不含根节点的骨骼链会被拒绝，不会得到一个“能用但是空”的适配器。
    pub fn new<B: BoneChain>(bone: Arc<B>) -> Result<Self, AdapterError> {
        bone.validate()?;
        let root = bone.root().cloned().ok_or(AdapterError::MissingRoot {
            bone: bone.id(),
            kind: bone.kind(),
        })?;
        Ok(Self { chain: bone, root })
    }

    /// 底层模拟对象的身份。
    pub fn id(&self) -> BoneId {
        self.chain.id()
    }

    pub fn kind(&self) -> BoneKind {
        self.chain.kind()
    }

    /// 链的锚点节点。
    pub fn root(&self) -> &Transform {
        &self.root
    }

    /// 链上离根节点最远的一端，供外部做距离/选择判断。
    pub fn terminal(&self) -> Transform {
        self.chain.terminal().unwrap_or_else(|| self.root.clone())
    }

    /// 链上全部节点（含根节点）。每次调用都会重新开始遍历。
    pub fn nodes(&self) -> impl Iterator<Item = Transform> + '_ {
        self.chain.nodes()
    }

    /// 模拟对象自己的碰撞体列表（活句柄）。
    pub fn colliders(&self) -> &ColliderList {
        self.chain.colliders()
    }

    pub fn comment(&self) -> Option<&str> {
        self.chain.comment()
    }
}

impl PartialEq for BoneAdapter {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for BoneAdapter {}

impl Hash for BoneAdapter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for BoneAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoneAdapter")
            .field("id", &self.id().short())
            .field("kind", &self.kind())
            .field("root", &self.root.name())
            .field("comment", &self.comment())
            .field("colliders", self.colliders())
            .finish()
    }
}

/// 把某种骨骼链表示转换成适配器。
///
/// 注册入口据此在编译期按表示类型分派，调用方无需关心具体表示。
pub trait IntoBoneAdapter {
    fn into_bone_adapter(self) -> Result<BoneAdapter, AdapterError>;
}

impl<B: BoneChain> IntoBoneAdapter for Arc<B> {
    fn into_bone_adapter(self) -> Result<BoneAdapter, AdapterError> {
        BoneAdapter::new(self)
    }
}

impl IntoBoneAdapter for BoneAdapter {
    fn into_bone_adapter(self) -> Result<BoneAdapter, AdapterError> {
        Ok(self)
    }
}

/// 构造适配器时的前置条件错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("{kind} {bone} 缺少根节点")]
    MissingRoot { bone: BoneId, kind: BoneKind },
    #[error("{kind} {bone} 的节点列表为空")]
    EmptyChain { bone: BoneId, kind: BoneKind },
    #[error("{kind} {bone} 的节点列表不包含根节点 `{root}`")]
    RootNotInChain {
        bone: BoneId,
        kind: BoneKind,
        root: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::bone::Particle;

    /// root -> a -> a1, root -> b
    fn hierarchy() -> (Transform, Transform, Transform, Transform) {
        let root = Transform::new("root").expect("应能创建根节点");
        let a = Transform::new("a").unwrap();
        let a1 = Transform::new("a1").unwrap();
        let b = Transform::new("b").unwrap();
        root.attach(&a).unwrap();
        a.attach(&a1).unwrap();
        root.attach(&b).unwrap();
        (root, a, a1, b)
    }

    fn names(adapter: &BoneAdapter) -> Vec<String> {
        adapter.nodes().map(|node| node.name()).collect()
    }

    #[test]
    fn classic_terminal_is_last_depth_first_descendant() {
        let (root, _a, _a1, b) = hierarchy();
        let adapter = BoneAdapter::new(Arc::new(DynamicBone::new(Some(root.clone()))))
            .expect("应能包装经典骨骼");

        assert_eq!(adapter.kind(), BoneKind::Classic);
        assert_eq!(adapter.root(), &root);
        assert_eq!(adapter.terminal(), b);
        assert_eq!(names(&adapter), ["a", "a1", "b", "root"]);
        assert_eq!(names(&adapter), ["a", "a1", "b", "root"], "节点序列应可重新开始");
    }

    #[test]
    fn classic_terminal_without_descendants_is_root() {
        let root = Transform::new("lonely").unwrap();
        let adapter = BoneAdapter::new(Arc::new(DynamicBone::new(Some(root.clone())))).unwrap();

        assert_eq!(adapter.terminal(), root);
        assert_eq!(names(&adapter), ["lonely"]);
    }

    #[test]
    fn ver01_terminal_is_last_particle() {
        let (root, a, a1, _b) = hierarchy();
        let bone = DynamicBoneVer01::new(
            Some(root.clone()),
            vec![
                Particle::new(root.clone(), None),
                Particle::new(a, Some(0)),
                Particle::new(a1.clone(), Some(1)),
            ],
        );
        let adapter = BoneAdapter::new(Arc::new(bone)).unwrap();

        assert_eq!(adapter.kind(), BoneKind::Ver01);
        assert_eq!(adapter.terminal(), a1);
        assert_eq!(names(&adapter), ["root", "a", "a1"]);
    }

    #[test]
    fn ver02_terminal_is_last_bone_and_exposes_comment() {
        let (root, _a, a1, _b) = hierarchy();
        let bone = DynamicBoneVer02::new(Some(root.clone()), vec![root.clone(), a1.clone()])
            .with_comment("mune_L");
        let adapter = BoneAdapter::new(Arc::new(bone)).unwrap();

        assert_eq!(adapter.kind(), BoneKind::Ver02);
        assert_eq!(adapter.terminal(), a1);
        assert_eq!(adapter.comment(), Some("mune_L"));
        assert_eq!(names(&adapter), ["root", "a1"]);
    }

    #[test]
    fn terminal_means_far_end_for_every_representation() {
        let nodes: Vec<Transform> = ["tail", "tail_1", "tail_2"]
            .into_iter()
            .map(|name| Transform::new(name).unwrap())
            .collect();
        nodes[0].attach(&nodes[1]).unwrap();
        nodes[1].attach(&nodes[2]).unwrap();
        let root = nodes[0].clone();

        let adapters = [
            BoneAdapter::new(Arc::new(DynamicBone::new(Some(root.clone())))).unwrap(),
            BoneAdapter::new(Arc::new(DynamicBoneVer01::from_root(root.clone()))).unwrap(),
            BoneAdapter::new(Arc::new(DynamicBoneVer02::from_root(root))).unwrap(),
        ];
        for adapter in &adapters {
            assert_eq!(adapter.terminal(), nodes[2], "{:?}", adapter.kind());
            assert_eq!(adapter.nodes().count(), 3);
        }
    }

    #[test]
    fn construction_rejects_missing_root() {
        let bone = Arc::new(DynamicBone::new(None));
        let id = bone.id();
        assert_eq!(
            BoneAdapter::new(bone).unwrap_err(),
            AdapterError::MissingRoot {
                bone: id,
                kind: BoneKind::Classic
            }
        );
    }

    #[test]
    fn construction_rejects_empty_explicit_chains() {
        let root = Transform::new("root").unwrap();

        let v1 = Arc::new(DynamicBoneVer01::new(Some(root.clone()), Vec::new()));
        assert!(matches!(
            BoneAdapter::new(v1),
            Err(AdapterError::EmptyChain {
                kind: BoneKind::Ver01,
                ..
            })
        ));

        let v2 = Arc::new(DynamicBoneVer02::new(Some(root), Vec::new()));
        assert!(matches!(
            BoneAdapter::new(v2),
            Err(AdapterError::EmptyChain {
                kind: BoneKind::Ver02,
                ..
            })
        ));

        let v2_rootless = Arc::new(DynamicBoneVer02::new(None, Vec::new()));
        assert!(matches!(
            BoneAdapter::new(v2_rootless),
            Err(AdapterError::MissingRoot { .. })
        ));
    }

    #[test]
    fn construction_rejects_explicit_chains_without_root() {
        let (root, a, a1, _b) = hierarchy();

        let v1 = Arc::new(DynamicBoneVer01::new(
            Some(root.clone()),
            vec![Particle::new(a.clone(), None), Particle::new(a1.clone(), Some(0))],
        ));
        let v1_id = v1.id();
        assert_eq!(
            BoneAdapter::new(v1).unwrap_err(),
            AdapterError::RootNotInChain {
                bone: v1_id,
                kind: BoneKind::Ver01,
                root: "root".to_owned(),
            }
        );

        let v2 = Arc::new(DynamicBoneVer02::new(Some(root), vec![a, a1]));
        assert!(matches!(
            BoneAdapter::new(v2),
            Err(AdapterError::RootNotInChain {
                kind: BoneKind::Ver02,
                ..
            })
        ));
    }

    #[test]
    fn adapters_over_same_bone_are_equal_and_share_colliders() {
        let root = Transform::new("root").unwrap();
        let bone = Arc::new(DynamicBone::new(Some(root)));
        let first = BoneAdapter::new(Arc::clone(&bone)).unwrap();
        let second = Arc::clone(&bone).into_bone_adapter().unwrap();

        assert_eq!(first, second);
        assert!(first.colliders().ptr_eq(bone.colliders()));
        assert!(second.colliders().ptr_eq(bone.colliders()));
    }
}
