//! 三种互不兼容的动态骨骼链表示。
//!
//! 它们对应宿主引擎中并存的三代骨骼模拟组件，结构各不相同：
//! - [`DynamicBone`]：只记录根节点，链上的节点由根节点的场景层级推导；
//! - [`DynamicBoneVer01`]：显式保存一组粒子，每个粒子携带一个节点；
//! - [`DynamicBoneVer02`]：显式保存有序的骨骼节点列表，并带有一条文本注释（常用来区分身体部位）。
//!
//! 三者都由宿主以 `Arc<_>` 持有；碰撞体列表归模拟对象所有。

use super::{collider::ColliderList, id::BoneId, transform::Transform};

/// 经典动态骨骼。
#[derive(Debug)]
pub struct DynamicBone {
    id: BoneId,
    root: Option<Transform>,
    colliders: ColliderList,
}

impl DynamicBone {
    pub fn new(root: Option<Transform>) -> Self {
        Self {
            id: BoneId::new(),
            root,
            colliders: ColliderList::new(),
        }
    }

    pub fn id(&self) -> BoneId {
        self.id
    }

    pub fn root(&self) -> Option<&Transform> {
        self.root.as_ref()
    }

    /// 模拟对象自己的碰撞体列表（共享句柄）。
    pub fn colliders(&self) -> &ColliderList {
        &self.colliders
    }
}

/// [`DynamicBoneVer01`] 的模拟粒子。
#[derive(Debug, Clone)]
pub struct Particle {
    transform: Transform,
    parent_index: Option<usize>,
}

impl Particle {
    pub fn new(transform: Transform, parent_index: Option<usize>) -> Self {
        Self {
            transform,
            parent_index,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// 父粒子在粒子列表中的下标；链首粒子为 `None`。
    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }
}

/// 第一代显式粒子表示。
#[derive(Debug)]
pub struct DynamicBoneVer01 {
    id: BoneId,
    root: Option<Transform>,
    particles: Vec<Particle>,
    colliders: ColliderList,
}

impl DynamicBoneVer01 {
    pub fn new(root: Option<Transform>, particles: Vec<Particle>) -> Self {
        Self {
            id: BoneId::new(),
            root,
            particles,
            colliders: ColliderList::new(),
        }
    }

    /// 按模拟组件初始化时的做法，从根节点层级构建粒子列表（根节点在前，后代按深度优先先序）。
    pub fn from_root(root: Transform) -> Self {
        let mut particles = vec![Particle::new(root.clone(), None)];
        for node in root.descendants() {
            let parent_index = node.parent().and_then(|parent| {
                particles
                    .iter()
                    .position(|particle| particle.transform == parent)
            });
            particles.push(Particle::new(node, parent_index));
        }
        Self::new(Some(root), particles)
    }

    pub fn id(&self) -> BoneId {
        self.id
    }

    pub fn root(&self) -> Option<&Transform> {
        self.root.as_ref()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn colliders(&self) -> &ColliderList {
        &self.colliders
    }
}

/// 第二代显式骨骼列表表示。
#[derive(Debug)]
pub struct DynamicBoneVer02 {
    id: BoneId,
    root: Option<Transform>,
    bones: Vec<Transform>,
    comment: Option<String>,
    colliders: ColliderList,
}

impl DynamicBoneVer02 {
    pub fn new(root: Option<Transform>, bones: Vec<Transform>) -> Self {
        Self {
            id: BoneId::new(),
            root,
            bones,
            comment: None,
            colliders: ColliderList::new(),
        }
    }

    /// 从根节点层级构建骨骼列表（根节点在前，后代按深度优先先序）。
    pub fn from_root(root: Transform) -> Self {
        let bones = std::iter::once(root.clone())
            .chain(root.descendants())
            .collect();
        Self::new(Some(root), bones)
    }

    /// Builder 风格：附加注释（例如 `mune_L`）。
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn id(&self) -> BoneId {
        self.id
    }

    pub fn root(&self) -> Option<&Transform> {
        self.root.as_ref()
    }

    pub fn bones(&self) -> &[Transform] {
        &self.bones
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn colliders(&self) -> &ColliderList {
        &self.colliders
    }
}
