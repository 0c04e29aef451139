use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};

use nalgebra::Vector3;
use parking_lot::RwLock;
use thiserror::Error;

use super::id::NodeId;

/// 场景节点句柄（宿主引擎中 `Transform` 的最小替身）。
///
/// `Transform` 是一个可廉价克隆的共享句柄：克隆得到的是**同一个**节点。
/// 节点携带名称、局部坐标（相对父节点）以及有序子节点列表；父节点以弱引用保存，
/// 因此节点树不会形成引用环。
///
/// 名称约束与节点组件一致：
/// - 不能为空字符串；
/// - 不得包含空白字符；
/// - 不得包含字符 `/`。
///
/// 相等性与哈希只看 [`NodeId`]。
#[derive(Clone)]
pub struct Transform {
    inner: Arc<TransformInner>,
}

struct TransformInner {
    id: NodeId,
    state: RwLock<TransformState>,
}

struct TransformState {
    name: String,
    position: Vector3<f32>,
    parent: Option<Weak<TransformInner>>,
    children: Vec<Transform>,
}

impl Transform {
    /// 创建一个位于原点、没有父节点的节点，并校验名称规则。
    pub fn new(name: impl Into<String>) -> Result<Self, NodeNameError> {
        Self::with_position(name, Vector3::zeros())
    }

    /// 使用指定的局部坐标创建节点。
    pub fn with_position(
        name: impl Into<String>,
        position: Vector3<f32>,
    ) -> Result<Self, NodeNameError> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self {
            inner: Arc::new(TransformInner {
                id: NodeId::new(),
                state: RwLock::new(TransformState {
                    name,
                    position,
                    parent: None,
                    children: Vec::new(),
                }),
            }),
        })
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// 返回节点名称。
    pub fn name(&self) -> String {
        self.inner.state.read().name.clone()
    }

    /// 当前局部坐标。
    pub fn position(&self) -> Vector3<f32> {
        self.inner.state.read().position
    }

    /// 设置局部坐标。
    pub fn set_position(&self, position: Vector3<f32>) {
        self.inner.state.write().position = position;
    }

    /// 返回父节点（若存在且仍然存活）。
    pub fn parent(&self) -> Option<Transform> {
        let state = self.inner.state.read();
        state
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Transform { inner })
    }

    /// 返回子节点列表的拷贝（句柄克隆，指向同一批节点）。
    pub fn children(&self) -> Vec<Transform> {
        self.inner.state.read().children.clone()
    }

    /// 按深度优先先序遍历全部后代节点（不含自身）。
    ///
    /// 遍历是惰性的；每次调用都会从头重新开始。
    pub fn descendants(&self) -> Descendants {
        let mut stack = self.children();
        stack.reverse();
        Descendants { stack }
    }

    /// 从父节点开始向上遍历祖先链。
    ///
    /// [`Transform::attach`] 保证父链无环；这里仍以已访问集合截断，遇到重复节点即停止。
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            visited: HashSet::from([self.id()]),
            current: self.parent(),
        }
    }

    /// 世界坐标：沿父链累加局部坐标。
    pub fn world_position(&self) -> Vector3<f32> {
        self.ancestors()
            .fold(self.position(), |position, node| position + node.position())
    }

    /// 构建从根节点开始的路径表示，例如 `root/branch/leaf`。
    pub fn path(&self) -> String {
        let mut segments = vec![self.name()];
        segments.extend(self.ancestors().map(|node| node.name()));
        segments.reverse();
        segments.join("/")
    }

    /// 将 `child` 挂载到当前节点下。
    ///
    /// 若 `child` 已挂在别的节点下，会先从旧父节点移除。
    pub fn attach(&self, child: &Transform) -> Result<(), HierarchyError> {
        if child == self {
            return Err(HierarchyError::SelfAttachment(child.id()));
        }

        if self.has_ancestor(child) {
            return Err(HierarchyError::HierarchyCycle {
                ancestor: self.id(),
                descendant: child.id(),
            });
        }

        let previous_parent = child.parent();
        if previous_parent.as_ref() == Some(self) {
            let mut state = self.inner.state.write();
            if !state.children.contains(child) {
                state.children.push(child.clone());
            }
            return Ok(());
        }

        if let Some(old_parent) = previous_parent {
            old_parent
                .inner
                .state
                .write()
                .children
                .retain(|existing| existing != child);
        }

        child.inner.state.write().parent = Some(Arc::downgrade(&self.inner));
        self.inner.state.write().children.push(child.clone());
        Ok(())
    }

    fn has_ancestor(&self, candidate: &Transform) -> bool {
        self.ancestors().any(|node| &node == candidate)
    }

    fn validate_name(name: &str) -> Result<(), NodeNameError> {
        if name.is_empty() {
            return Err(NodeNameError::Empty);
        }
        if name.contains('/') {
            return Err(NodeNameError::ContainsSlash);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(NodeNameError::ContainsWhitespace);
        }
        Ok(())
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Transform {}

impl Hash for Transform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Transform")
            .field("id", &self.inner.id.short())
            .field("name", &state.name)
            .field("position", &state.position)
            .field("children", &state.children.len())
            .finish()
    }
}

/// [`Transform::descendants`] 返回的深度优先先序迭代器。
pub struct Descendants {
    stack: Vec<Transform>,
}

/// 祖先迭代器，由 [`Transform::ancestors`] 返回，从父节点开始。
pub struct Ancestors {
    visited: HashSet<NodeId>,
    current: Option<Transform>,
}

impl Iterator for Ancestors {
    type Item = Transform;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current.take()?;
        if !self.visited.insert(node.id()) {
            return None;
        }
        self.current = node.parent();
        Some(node)
    }
}

impl Iterator for Descendants {
    type Item = Transform;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children = node.children();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

/// 节点名称格式错误。
#[derive(Debug, PartialEq, Eq, Error)]
pub enum NodeNameError {
    #[error("节点名称不能为空")]
    Empty,
    #[error("节点名称不能包含 '/'")]
    ContainsSlash,
    #[error("节点名称不能包含空白字符")]
    ContainsWhitespace,
}

/// 节点关系维护中的错误类型。
#[derive(Debug, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// 尝试将节点挂载到自身。
    #[error("节点 {0} 不能挂载到自身")]
    SelfAttachment(NodeId),
    /// 操作会导致祖先/后代之间形成环。
    #[error("将节点 {descendant} 挂载到 {ancestor} 会导致层级循环")]
    HierarchyCycle {
        ancestor: NodeId,
        descendant: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> Transform {
        Transform::new(name).expect("应能创建节点")
    }

    #[test]
    fn attach_sets_parent_and_child() {
        let parent = node("node_parent");
        let child = node("node_child");

        parent.attach(&child).expect("应当可以挂载子节点");

        assert_eq!(parent.children(), vec![child.clone()]);
        assert_eq!(child.parent(), Some(parent));
    }

    #[test]
    fn reattach_moves_child_between_parents() {
        let parent_a = node("node_a");
        let parent_b = node("node_b");
        let child = node("node_child");

        parent_a.attach(&child).unwrap();
        parent_b.attach(&child).expect("重新挂载应成功");

        assert!(parent_a.children().is_empty());
        assert_eq!(parent_b.children(), vec![child.clone()]);
        assert_eq!(child.parent(), Some(parent_b));
    }

    #[test]
    fn attach_twice_keeps_single_child_entry() {
        let parent = node("node_parent");
        let child = node("node_child");
        parent.attach(&child).unwrap();
        parent.attach(&child).unwrap();
        assert_eq!(parent.children().len(), 1);
    }

    #[test]
    fn attach_detects_cycle_and_self_attachment() {
        let parent = node("node_parent");
        let child = node("node_child");
        parent.attach(&child).unwrap();

        assert_eq!(
            child.attach(&parent),
            Err(HierarchyError::HierarchyCycle {
                ancestor: child.id(),
                descendant: parent.id(),
            })
        );
        assert_eq!(
            parent.attach(&parent),
            Err(HierarchyError::SelfAttachment(parent.id()))
        );
    }

    #[test]
    fn node_name_validation_rules() {
        assert!(matches!(Transform::new(""), Err(NodeNameError::Empty)));
        assert!(matches!(
            Transform::new("has space"),
            Err(NodeNameError::ContainsWhitespace)
        ));
        assert!(matches!(
            Transform::new("slash/inside"),
            Err(NodeNameError::ContainsSlash)
        ));
        assert!(Transform::new("valid_name").is_ok());
    }

    #[test]
    fn descendants_walk_depth_first_pre_order() {
        let root = node("root");
        let a = node("a");
        let a1 = node("a1");
        let b = node("b");
        let b1 = node("b1");
        let b2 = node("b2");
        root.attach(&a).unwrap();
        a.attach(&a1).unwrap();
        root.attach(&b).unwrap();
        b.attach(&b1).unwrap();
        b.attach(&b2).unwrap();

        let names: Vec<String> = root.descendants().map(|n| n.name()).collect();
        assert_eq!(names, ["a", "a1", "b", "b1", "b2"]);

        let again: Vec<String> = root.descendants().map(|n| n.name()).collect();
        assert_eq!(names, again, "遍历应可重新开始");
        assert_eq!(a1.descendants().count(), 0);
    }

    #[test]
    fn world_position_accumulates_parent_chain() {
        let root = Transform::with_position("root", Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let child = Transform::with_position("child", Vector3::new(0.0, 2.0, 0.0)).unwrap();
        root.attach(&child).unwrap();
        child.set_position(Vector3::new(0.0, 2.0, 3.0));

        assert_eq!(child.world_position(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn ancestors_walk_from_parent_to_root() {
        let root = node("root");
        let branch = node("branch");
        let leaf = node("leaf");
        root.attach(&branch).unwrap();
        branch.attach(&leaf).unwrap();

        let names: Vec<String> = leaf.ancestors().map(|n| n.name()).collect();
        assert_eq!(names, ["branch", "root"]);
        assert_eq!(root.ancestors().count(), 0);
    }

    #[test]
    fn path_builds_hierarchy_identifier() {
        let root = node("root");
        let branch = node("branch");
        let leaf = node("leaf");
        root.attach(&branch).unwrap();
        branch.attach(&leaf).unwrap();

        assert_eq!(root.path(), "root");
        assert_eq!(branch.path(), "root/branch");
        assert_eq!(leaf.path(), "root/branch/leaf");
    }
}
