use crate::components::AvatarRoot;
use crate::resources::{AvatarAnimation, AvatarRoles, AvatarSettings};
use crate::to_core;
use bevy::gltf::GltfAssetLabel;
use bevy::prelude::*;
use bevy::render::mesh::morph::MorphWeights;
use bevy::scene::SceneInstanceReady;
use kiosk_core::{RestPose, SceneNode};
use tracing::{debug, info};

/// Spawn the avatar scene at its configured placement
pub fn spawn_avatar(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<AvatarSettings>,
) {
    info!("Loading avatar '{}'", settings.model_path);

    let scene_handle =
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(settings.model_path.clone()));

    let transform = Transform::from_translation(Vec3::from_array(settings.position))
        .with_scale(Vec3::splat(settings.scale));

    commands.spawn((AvatarRoot, SceneRoot(scene_handle), transform));
}

/// Bind face and teeth once the avatar scene has been instantiated.
///
/// Runs again on every reload of the asset; the session keeps the rest pose
/// captured the first time.
pub fn bind_avatar_scene(
    trigger: Trigger<SceneInstanceReady>,
    roots: Query<(), With<AvatarRoot>>,
    children: Query<&Children>,
    nodes: Query<(&Name, &Transform, Option<&MorphWeights>)>,
    meshes: Res<Assets<Mesh>>,
    roles: Res<AvatarRoles>,
    mut animation: ResMut<AvatarAnimation>,
) {
    let root = trigger.target();
    if roots.get(root).is_err() {
        return;
    }

    let scene_nodes: Vec<SceneNode<Entity>> = children
        .iter_descendants(root)
        .filter_map(|entity| {
            let (name, transform, weights) = nodes.get(entity).ok()?;
            Some(SceneNode {
                handle: entity,
                name: name.as_str().to_string(),
                morph_targets: weights
                    .map(|w| morph_target_names(w, &meshes))
                    .unwrap_or_default(),
                pose: rest_pose(transform),
            })
        })
        .collect();

    debug!("Avatar scene ready with {} named nodes", scene_nodes.len());
    animation.0.bind_scene(scene_nodes, &roles.0);
}

/// Release the session state when the avatar is despawned
pub fn release_avatar(_trigger: Trigger<OnRemove, AvatarRoot>, mut animation: ResMut<AvatarAnimation>) {
    animation.0.teardown();
}

fn morph_target_names(weights: &MorphWeights, meshes: &Assets<Mesh>) -> Vec<String> {
    weights
        .first_mesh()
        .and_then(|handle| meshes.get(handle))
        .and_then(|mesh| mesh.morph_target_names())
        .map(|names| names.to_vec())
        .unwrap_or_default()
}

/// Local pose of a node as position plus Euler XYZ rotation
pub fn rest_pose(transform: &Transform) -> RestPose {
    let (x, y, z) = transform.rotation.to_euler(EulerRot::XYZ);
    RestPose::new(
        to_core(transform.translation),
        kiosk_core::Vec3::new(x, y, z),
    )
}
