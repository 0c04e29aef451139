use uuid::Uuid;

macro_rules! scene_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// 创建一个新的随机 ID。
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// 生成一个更短、更适合作为默认名称/日志字段的字符串（前 8 个十六进制字符）。
            pub fn short(self) -> String {
                let s = self.0.simple().to_string();
                s.chars().take(8).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

scene_id! {
    /// 场景节点（[`Transform`](super::transform::Transform)）的唯一标识。
    NodeId
}

scene_id! {
    /// 碰撞体（[`DynamicBoneCollider`](super::collider::DynamicBoneCollider)）的唯一标识。
    ///
    /// 注册表以它作为键：同一个碰撞体重复注册会覆盖其选择谓词，而不是追加一条新记录。
    ColliderId
}

scene_id! {
    /// 动态骨骼链（任意一种表示）的唯一标识。
    ///
    /// 适配器的相等性由底层骨骼对象的 `BoneId` 决定，而不是适配器实例本身。
    BoneId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
        assert_ne!(BoneId::new(), BoneId::new());
    }

    #[test]
    fn short_takes_eight_hex_chars() {
        let id = ColliderId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(short.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(id.to_string().replace('-', "").starts_with(&short));
    }
}
