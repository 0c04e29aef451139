use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use nalgebra::Vector3;
use parking_lot::Mutex;

use super::{id::ColliderId, transform::Transform};

/// 碰撞体作用于骨骼节点的哪一侧。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bound {
    /// 把节点推到碰撞体外部。
    #[default]
    Outside,
    /// 把节点限制在碰撞体内部。
    Inside,
}

/// 胶囊体的轴向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    X,
    Y,
    Z,
}

/// 碰撞体的几何参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderShape {
    pub radius: f32,
    /// 胶囊体高度；为 0 时退化为球体。
    pub height: f32,
    /// 相对锚点的中心偏移。
    pub center: Vector3<f32>,
    pub bound: Bound,
    pub direction: Direction,
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 0.0,
            center: Vector3::zeros(),
            bound: Bound::Outside,
            direction: Direction::X,
        }
    }
}

/// 动态骨骼碰撞体句柄。
///
/// 碰撞体挂在某个锚点节点上（例如 VR 手柄），模拟引擎在解算骨骼节点约束时会查询它。
/// 注册表只关心它的身份：克隆得到的是同一个碰撞体，相等性与哈希只看 [`ColliderId`]。
#[derive(Clone)]
pub struct DynamicBoneCollider {
    inner: Arc<ColliderInner>,
}

struct ColliderInner {
    id: ColliderId,
    anchor: Transform,
    shape: ColliderShape,
}

impl DynamicBoneCollider {
    /// 在 `anchor` 上创建一个碰撞体。
    pub fn new(anchor: Transform, shape: ColliderShape) -> Self {
        Self {
            inner: Arc::new(ColliderInner {
                id: ColliderId::new(),
                anchor,
                shape,
            }),
        }
    }

    pub fn id(&self) -> ColliderId {
        self.inner.id
    }

    /// 碰撞体所挂载的锚点节点。
    pub fn anchor(&self) -> &Transform {
        &self.inner.anchor
    }

    /// 几何参数。创建后不再变化。
    pub fn shape(&self) -> ColliderShape {
        self.inner.shape
    }

    pub fn radius(&self) -> f32 {
        self.inner.shape.radius
    }

    pub fn center(&self) -> Vector3<f32> {
        self.inner.shape.center
    }
}

impl PartialEq for DynamicBoneCollider {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for DynamicBoneCollider {}

impl Hash for DynamicBoneCollider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for DynamicBoneCollider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBoneCollider")
            .field("id", &self.inner.id.short())
            .field("anchor", &self.inner.anchor.name())
            .field("shape", &self.inner.shape)
            .finish()
    }
}

/// 骨骼链的碰撞体列表。
///
/// 这是模拟对象**自己持有**的那份列表的共享句柄：克隆得到的是同一份列表，
/// 通过任何一个句柄做的修改都会立即被模拟引擎看到。注册表只借用写权限，不拥有它。
///
/// 成员判断是线性扫描；每条链上的碰撞体通常只有个位数。
#[derive(Clone, Default)]
pub struct ColliderList {
    inner: Arc<Mutex<Vec<DynamicBoneCollider>>>,
}

impl ColliderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, collider: &DynamicBoneCollider) -> bool {
        self.inner.lock().contains(collider)
    }

    /// 直接追加，不做去重（与模拟引擎自身的行为一致）。
    pub fn push(&self, collider: DynamicBoneCollider) {
        self.inner.lock().push(collider);
    }

    /// 不存在时追加；返回是否发生了插入。
    pub fn insert_unique(&self, collider: &DynamicBoneCollider) -> bool {
        let mut list = self.inner.lock();
        if list.contains(collider) {
            return false;
        }
        list.push(collider.clone());
        true
    }

    /// 移除第一次出现的 `collider`；返回是否发生了移除。
    pub fn remove(&self, collider: &DynamicBoneCollider) -> bool {
        let mut list = self.inner.lock();
        match list.iter().position(|existing| existing == collider) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// 当前内容的快照。
    pub fn snapshot(&self) -> Vec<DynamicBoneCollider> {
        self.inner.lock().clone()
    }

    /// 当前内容对应的 ID 序列。
    pub fn ids(&self) -> Vec<ColliderId> {
        self.inner.lock().iter().map(DynamicBoneCollider::id).collect()
    }

    /// 两个句柄是否指向同一份列表。
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ColliderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.ids().iter().map(|id| id.short()).collect();
        f.debug_tuple("ColliderList").field(&ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collider() -> DynamicBoneCollider {
        let anchor = Transform::new("controller").expect("应能创建锚点节点");
        DynamicBoneCollider::new(anchor, ColliderShape::default())
    }

    #[test]
    fn clones_share_identity_and_shape() {
        let anchor = Transform::new("hand").unwrap();
        let shape = ColliderShape {
            radius: 0.08,
            center: Vector3::new(0.0, -0.03, 0.01),
            ..ColliderShape::default()
        };
        let collider = DynamicBoneCollider::new(anchor, shape);
        let cloned = collider.clone();

        assert_eq!(collider, cloned);
        assert_eq!(cloned.radius(), 0.08);
        assert_eq!(cloned.center(), Vector3::new(0.0, -0.03, 0.01));
        assert_ne!(collider, self::collider());
    }

    #[test]
    fn list_clones_are_the_same_list() {
        let list = ColliderList::new();
        let view = list.clone();
        let collider = collider();

        assert!(view.insert_unique(&collider));
        assert!(list.contains(&collider));
        assert!(list.ptr_eq(&view));
        assert!(!list.ptr_eq(&ColliderList::new()));
    }

    #[test]
    fn insert_unique_and_remove_are_idempotent() {
        let list = ColliderList::new();
        let collider = collider();

        assert!(list.insert_unique(&collider));
        assert!(!list.insert_unique(&collider));
        assert_eq!(list.len(), 1);

        assert!(list.remove(&collider));
        assert!(!list.remove(&collider));
        assert!(list.is_empty());
    }

    #[test]
    fn remove_only_drops_first_occurrence() {
        let list = ColliderList::new();
        let collider = collider();
        list.push(collider.clone());
        list.push(collider.clone());

        assert!(list.remove(&collider));
        assert_eq!(list.ids(), vec![collider.id()]);
    }
}
