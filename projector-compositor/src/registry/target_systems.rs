use bevy::ecs::entity::Entities;
use bevy::prelude::*;

use super::target_registry::{
    DepthProxy, ProjectionTarget, ProjectorOverlay, TargetEntry, TargetRegistry,
    despawn_target_entry, spawn_target_entry,
};
use crate::config::ProjectorConfig;
use crate::engine::lifecycle::ProjectorResources;

/// Registers marked entities once they carry both the marker and a mesh,
/// whichever of the two arrived last.
#[allow(clippy::type_complexity)]
pub fn register_marked_targets(
    mut commands: Commands,
    mut registry: ResMut<TargetRegistry>,
    resources: Option<Res<ProjectorResources>>,
    added: Query<
        (Entity, Option<&Mesh3d>, Option<&GlobalTransform>),
        (
            With<ProjectionTarget>,
            Or<(Added<ProjectionTarget>, Added<Mesh3d>)>,
        ),
    >,
) {
    let Some(resources) = resources else {
        return;
    };
    let materials = resources.target_materials();

    for (target, mesh, transform) in &added {
        if registry.contains(target) {
            continue;
        }
        let (Some(mesh), Some(transform)) = (mesh, transform) else {
            debug!("Projection target {} has no mesh yet, waiting for Mesh3d", target);
            continue;
        };

        let entry = spawn_target_entry(&mut commands, &materials, target, mesh, transform);
        registry.insert(entry);
        debug!("Registered projection target {}", target);
    }
}

/// Unregisters entities that lost `ProjectionTarget` or were despawned.
pub fn unregister_unmarked_targets(
    mut commands: Commands,
    mut registry: ResMut<TargetRegistry>,
    mut removed: RemovedComponents<ProjectionTarget>,
) {
    for target in removed.read() {
        if let Some(entry) = registry.remove(target) {
            despawn_target_entry(&mut commands, &entry);
            debug!("Unregistered projection target {}", target);
        }
    }
}

/// Entries whose target entity no longer exists.
pub fn stale_entries(registry: &TargetRegistry, entities: &Entities) -> Vec<TargetEntry> {
    registry
        .entries()
        .filter(|entry| !entities.contains(entry.target))
        .copied()
        .collect()
}

/// Prunes stale entries when configured to, otherwise warns once per entry and
/// leaves the proxy at its last transform.
pub fn track_stale_targets(
    mut commands: Commands,
    mut registry: ResMut<TargetRegistry>,
    config: Res<ProjectorConfig>,
    entities: &Entities,
) {
    for entry in stale_entries(&registry, entities) {
        if config.prune_despawned_targets {
            registry.remove(entry.target);
            despawn_target_entry(&mut commands, &entry);
            debug!("Pruned despawned projection target {}", entry.target);
        } else if registry.mark_stale(entry.target) {
            warn!(
                "Projection target {} was despawned while registered, its proxy keeps the last transform",
                entry.target
            );
        }
    }
}

fn copy_target_transforms<M: Component>(
    registry: &TargetRegistry,
    targets: &Query<&GlobalTransform, Without<M>>,
    followers: &mut Query<&mut GlobalTransform, With<M>>,
    follower_of: impl Fn(&TargetEntry) -> Entity,
) {
    for entry in registry.entries() {
        let Ok(target) = targets.get(entry.target) else {
            continue;
        };
        if let Ok(mut follower) = followers.get_mut(follower_of(entry)) {
            follower.set_if_neq(*target);
        }
    }
}

/// Copies each target's world transform onto its depth proxy.
pub fn sync_proxy_transforms(
    registry: Res<TargetRegistry>,
    targets: Query<&GlobalTransform, Without<DepthProxy>>,
    mut proxies: Query<&mut GlobalTransform, With<DepthProxy>>,
) {
    copy_target_transforms(&registry, &targets, &mut proxies, |entry| entry.proxy);
}

/// Copies each target's world transform onto its overlay.
pub fn sync_overlay_transforms(
    registry: Res<TargetRegistry>,
    targets: Query<&GlobalTransform, Without<ProjectorOverlay>>,
    mut overlays: Query<&mut GlobalTransform, With<ProjectorOverlay>>,
) {
    copy_target_transforms(&registry, &targets, &mut overlays, |entry| entry.overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn transforms_are_copied_exactly() {
        let mut world = World::new();
        let moved = GlobalTransform::from(
            Transform::from_xyz(1.25, -3.5, 7.0)
                .with_rotation(Quat::from_rotation_y(0.3))
                .with_scale(Vec3::new(1.0, 2.0, 0.5)),
        );
        let target = world.spawn(moved).id();
        let overlay = world
            .spawn((ProjectorOverlay { target }, GlobalTransform::IDENTITY))
            .id();
        let proxy = world
            .spawn((DepthProxy { target }, GlobalTransform::IDENTITY))
            .id();

        let mut registry = TargetRegistry::default();
        registry.insert(TargetEntry {
            target,
            overlay,
            proxy,
        });
        world.insert_resource(registry);

        world.run_system_once(sync_proxy_transforms).unwrap();
        assert_eq!(world.get::<GlobalTransform>(proxy), Some(&moved));
        assert_eq!(world.get::<GlobalTransform>(overlay), Some(&GlobalTransform::IDENTITY));

        world.run_system_once(sync_overlay_transforms).unwrap();
        assert_eq!(world.get::<GlobalTransform>(overlay), Some(&moved));
    }

    #[test]
    fn despawned_target_leaves_proxy_in_place() {
        let mut world = World::new();
        let last = GlobalTransform::from_xyz(4.0, 0.0, 0.0);
        let target = world.spawn(last).id();
        let proxy = world.spawn((DepthProxy { target }, last)).id();
        let overlay = world.spawn((ProjectorOverlay { target }, last)).id();

        let mut registry = TargetRegistry::default();
        registry.insert(TargetEntry {
            target,
            overlay,
            proxy,
        });
        world.insert_resource(registry);
        world.despawn(target);

        world.run_system_once(sync_proxy_transforms).unwrap();
        assert_eq!(world.get::<GlobalTransform>(proxy), Some(&last));

        let registry = world.resource::<TargetRegistry>();
        let stale = stale_entries(registry, world.entities());
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].target, target);
    }
}
