use nalgebra::Vector3;

use crate::scene::collider::{Bound, ColliderShape, Direction};

/// 单个手部碰撞体的配置。
///
/// - `radius`：半径
/// - `center`：相对手柄节点的中心偏移
/// - `bound` / `direction`：作用侧与胶囊轴向
pub struct ColliderShapeConfig {
    pub radius: f32,
    pub center: Vector3<f32>,
    pub bound: Bound,
    pub direction: Direction,
}

impl ColliderShapeConfig {
    fn with_radius(radius: f32) -> Self {
        Self {
            radius,
            center: Vector3::new(0.0, -0.03, 0.01),
            bound: Bound::Outside,
            direction: Direction::X,
        }
    }

    /// 转换成碰撞体几何参数。
    pub fn shape(&self) -> ColliderShape {
        ColliderShape {
            radius: self.radius,
            height: 0.0,
            center: self.center,
            bound: self.bound,
            direction: self.direction,
        }
    }
}

/// 每个手柄上挂载的两个碰撞体。
///
/// - `bust`：只作用于胸部骨骼链
/// - `hand`：作用于其余所有骨骼链
pub struct HandColliderConfig {
    pub bust: ColliderShapeConfig,
    pub hand: ColliderShapeConfig,
}

impl Default for HandColliderConfig {
    fn default() -> Self {
        Self {
            bust: ColliderShapeConfig::with_radius(0.06),
            hand: ColliderShapeConfig::with_radius(0.08),
        }
    }
}

/// 运行配置。
///
/// - `hand_colliders`：站立模式下每个手柄创建的碰撞体
/// - `bust_comment_prefix`：骨骼链注释以此开头时视为胸部骨骼链
pub struct SwayConfig {
    pub hand_colliders: HandColliderConfig,
    pub bust_comment_prefix: String,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            hand_colliders: HandColliderConfig::default(),
            bust_comment_prefix: String::from("mune"),
        }
    }
}
