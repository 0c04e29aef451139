use std::sync::Arc;

use anyhow::{Context, anyhow};
use nalgebra::Vector3;
use tracing::{info, warn};

use sway_core::{
    BoneAdapter, SharedColliderRegistry,
    config::SwayConfig,
    lifecycle::{ModeManager, SeatedMode, StandingMode},
    logger,
    scene::{DynamicBone, DynamicBoneVer01, DynamicBoneVer02, Transform},
};

/// 演示场景里的角色骨骼。
struct Character {
    hair: Arc<DynamicBone>,
    skirt: Arc<DynamicBoneVer01>,
    bust_left: Arc<DynamicBoneVer02>,
    bust_right: Arc<DynamicBoneVer02>,
}

fn main() -> anyhow::Result<()> {
    logger::init()?;

    let config = SwayConfig::default();
    let registry = SharedColliderRegistry::new();

    let left = Transform::with_position("controller_left", Vector3::new(-0.2, 1.2, 0.3))?;
    let right = Transform::with_position("controller_right", Vector3::new(0.2, 1.2, 0.3))?;
    let mut modes = ModeManager::new(left.clone(), right.clone());

    modes
        .set_mode(Box::new(StandingMode::new(registry.clone(), &config)))
        .context("进入站立模式失败")?;

    let character = build_character().context("构建演示角色失败")?;
    registry.with(|registry| {
        registry.register_dynamic_bone(Arc::clone(&character.hair))?;
        registry.register_dynamic_bone(Arc::clone(&character.skirt))?;
        registry.register_dynamic_bone(Arc::clone(&character.bust_left))?;
        registry.register_dynamic_bone(Arc::clone(&character.bust_right))?;
        // 场景逻辑偶尔会对同一根骨骼重复发出注册事件。
        if let Err(err) = registry.register_dynamic_bone(Arc::clone(&character.hair)) {
            warn!(target: "sway-demo", error = %err, "duplicate registration rejected");
        }
        Ok::<(), sway_core::RegistryError>(())
    })?;

    registry.with(|registry| {
        for bone in registry.bones() {
            report(bone);
        }

        let hand = left.world_position();
        let nearest = registry
            .nearest_bone(&hand)
            .ok_or_else(|| anyhow!("场景中没有已注册的骨骼链"))?;
        info!(
            target: "sway-demo",
            bone = %nearest.root().path(),
            terminal = %nearest.terminal().name(),
            "nearest chain to left controller"
        );
        Ok::<(), anyhow::Error>(())
    })?;

    modes
        .set_mode(Box::new(SeatedMode::new(registry.clone())))
        .context("进入坐姿模式失败")?;

    info!(
        target: "sway-demo",
        registered = registry.lock().bones().len(),
        hair_colliders = character.hair.colliders().len(),
        "switched to seated mode"
    );

    Ok(())
}

fn build_character() -> anyhow::Result<Character> {
    let body = Transform::with_position("cf_J_Root", Vector3::new(0.0, 0.0, 0.6))?;

    let hair_root = Transform::with_position("cf_J_hair_B", Vector3::new(0.0, 1.6, 0.0))?;
    body.attach(&hair_root)?;
    chain(&hair_root, "cf_J_hair_B", 3, Vector3::new(0.0, -0.08, -0.02))?;

    let skirt_root = Transform::with_position("cf_J_sk_00", Vector3::new(0.0, 0.9, 0.0))?;
    body.attach(&skirt_root)?;
    chain(&skirt_root, "cf_J_sk_00", 4, Vector3::new(0.0, -0.1, 0.02))?;

    let bust = |side: &str, x: f32| -> anyhow::Result<Arc<DynamicBoneVer02>> {
        let name = format!("cf_J_Mune00_{side}");
        let root = Transform::with_position(name.clone(), Vector3::new(x, 1.3, 0.08))?;
        body.attach(&root)?;
        chain(&root, &name, 2, Vector3::new(0.0, 0.0, 0.04))?;
        Ok(Arc::new(
            DynamicBoneVer02::from_root(root).with_comment(format!("mune_{side}")),
        ))
    };

    Ok(Character {
        hair: Arc::new(DynamicBone::new(Some(hair_root))),
        skirt: Arc::new(DynamicBoneVer01::from_root(skirt_root)),
        bust_left: bust("L", -0.08)?,
        bust_right: bust("R", 0.08)?,
    })
}

/// 在 `root` 下挂一条长度为 `length` 的线性子链。
fn chain(root: &Transform, prefix: &str, length: usize, step: Vector3<f32>) -> anyhow::Result<()> {
    let mut parent = root.clone();
    for index in 1..=length {
        let node = Transform::with_position(format!("{prefix}_{index:02}"), step)?;
        parent.attach(&node)?;
        parent = node;
    }
    Ok(())
}

fn report(bone: &BoneAdapter) {
    let radii: Vec<f32> = bone
        .colliders()
        .snapshot()
        .iter()
        .map(|collider| collider.radius())
        .collect();
    info!(
        target: "sway-demo",
        kind = %bone.kind(),
        root = %bone.root().name(),
        comment = bone.comment().unwrap_or("-"),
        nodes = bone.nodes().count(),
        ?radii,
        "chain colliders"
    );
}
