use std::collections::{HashMap, HashSet};

use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use constants::render_settings::PROJECTOR_DEPTH_LAYER;

use crate::render::materials::{DepthProxyMaterial, ProjectorOverlayMaterial};

/// Marks an entity with a `Mesh3d` as a projection target. Inserting it
/// registers the mesh, removing it (or despawning the entity) unregisters it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ProjectionTarget;

/// Overlay drawn over `target` with the projection material.
#[derive(Component, Debug, Clone, Copy)]
pub struct ProjectorOverlay {
    pub target: Entity,
}

/// Depth-only copy of `target`, visible to the projector camera alone.
#[derive(Component, Debug, Clone, Copy)]
pub struct DepthProxy {
    pub target: Entity,
}

/// One registered target. `target` is borrowed from the host scene,
/// `overlay` and `proxy` are owned by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetEntry {
    pub target: Entity,
    pub overlay: Entity,
    pub proxy: Entity,
}

/// Registered targets keyed by target entity.
#[derive(Resource, Debug, Default)]
pub struct TargetRegistry {
    entries: HashMap<Entity, TargetEntry>,
    stale_warned: HashSet<Entity>,
}

impl TargetRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, target: Entity) -> bool {
        self.entries.contains_key(&target)
    }

    pub fn get(&self, target: Entity) -> Option<&TargetEntry> {
        self.entries.get(&target)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TargetEntry> {
        self.entries.values()
    }

    /// Returns false and leaves the registry untouched if the target is already present.
    pub fn insert(&mut self, entry: TargetEntry) -> bool {
        if self.entries.contains_key(&entry.target) {
            return false;
        }
        self.entries.insert(entry.target, entry);
        true
    }

    pub fn remove(&mut self, target: Entity) -> Option<TargetEntry> {
        self.stale_warned.remove(&target);
        self.entries.remove(&target)
    }

    /// Empties the registry, handing back every entry.
    pub fn drain(&mut self) -> Vec<TargetEntry> {
        self.stale_warned.clear();
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    /// True the first time a stale target is reported.
    pub fn mark_stale(&mut self, target: Entity) -> bool {
        self.stale_warned.insert(target)
    }
}

/// Shared assets every overlay and proxy is spawned with.
#[derive(Debug, Clone)]
pub struct TargetMaterials {
    pub overlay: Handle<ProjectorOverlayMaterial>,
    pub proxy: Handle<DepthProxyMaterial>,
}

/// Spawns the overlay and depth proxy for `target`, both sharing its mesh and
/// starting at its current world transform.
pub fn spawn_target_entry(
    commands: &mut Commands,
    materials: &TargetMaterials,
    target: Entity,
    mesh: &Mesh3d,
    transform: &GlobalTransform,
) -> TargetEntry {
    let local = transform.compute_transform();

    let overlay = commands
        .spawn((
            Name::new("projector_overlay"),
            ProjectorOverlay { target },
            Mesh3d(mesh.0.clone()),
            MeshMaterial3d(materials.overlay.clone()),
            local,
            *transform,
            NotShadowCaster,
            NotShadowReceiver,
        ))
        .id();

    let proxy = commands
        .spawn((
            Name::new("projector_depth_proxy"),
            DepthProxy { target },
            Mesh3d(mesh.0.clone()),
            MeshMaterial3d(materials.proxy.clone()),
            local,
            *transform,
            RenderLayers::layer(PROJECTOR_DEPTH_LAYER),
            NotShadowCaster,
            NotShadowReceiver,
        ))
        .id();

    TargetEntry {
        target,
        overlay,
        proxy,
    }
}

/// Despawns the compositor-owned entities of an entry. Shared assets stay alive.
pub fn despawn_target_entry(commands: &mut Commands, entry: &TargetEntry) {
    for entity in [entry.overlay, entry.proxy] {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.try_despawn();
        }
    }
}
