use bevy::ecs::entity::Entities;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::lifecycle::{ProjectorLifecycle, ProjectorResources};
use crate::camera::projector_camera::ProjectorState;
use crate::error::ProjectorError;
use crate::registry::target_registry::{
    TargetEntry, TargetRegistry, despawn_target_entry, spawn_target_entry,
};
use crate::registry::target_systems::stale_entries;
use crate::render::composition::CompositionUniforms;
use crate::render::materials::{DepthProxyMaterial, ProjectorOverlayMaterial};

/// Host-facing handle to the compositor.
///
/// Every mutating call is a no-op with a warning once the compositor has been
/// disposed. Orientation setters recompute the projector transform before
/// returning.
#[derive(SystemParam)]
pub struct ProjectorCompositor<'w, 's> {
    commands: Commands<'w, 's>,
    state: ResMut<'w, ProjectorState>,
    uniforms: ResMut<'w, CompositionUniforms>,
    registry: ResMut<'w, TargetRegistry>,
    lifecycle: Res<'w, State<ProjectorLifecycle>>,
    next_lifecycle: ResMut<'w, NextState<ProjectorLifecycle>>,
    resources: Option<Res<'w, ProjectorResources>>,
    targets: Query<'w, 's, (&'static Mesh3d, &'static GlobalTransform)>,
    images: ResMut<'w, Assets<Image>>,
    overlay_materials: ResMut<'w, Assets<ProjectorOverlayMaterial>>,
    proxy_materials: ResMut<'w, Assets<DepthProxyMaterial>>,
    entities: &'w Entities,
}

impl ProjectorCompositor<'_, '_> {
    /// False from the moment `dispose` is called, even before the state
    /// transition has been applied.
    pub fn is_active(&self) -> bool {
        *self.lifecycle.get() == ProjectorLifecycle::Active
            && !matches!(*self.next_lifecycle, NextState::Pending(ProjectorLifecycle::Disposed))
    }

    fn ensure_active(&self, operation: &str) -> bool {
        if !self.is_active() {
            warn!("Projector compositor already disposed, ignoring {}", operation);
        }
        self.is_active()
    }

    /// Registers `target`, spawning its overlay and depth proxy. Adding an
    /// already registered target does nothing.
    pub fn add_target_mesh(&mut self, target: Entity) {
        if !self.ensure_active("add_target_mesh") || self.registry.contains(target) {
            return;
        }
        let Some(resources) = self.resources.as_deref() else {
            warn!("Projector resources not created yet, cannot add {}", target);
            return;
        };
        let Ok((mesh, transform)) = self.targets.get(target) else {
            warn!("{}", ProjectorError::TargetNotFound(target));
            return;
        };

        let materials = resources.target_materials();
        let entry = spawn_target_entry(&mut self.commands, &materials, target, mesh, transform);
        self.registry.insert(entry);
        debug!("Added projection target {}", target);
    }

    /// Unregisters `target` and despawns its overlay and proxy. Shared assets
    /// stay alive until `dispose`. Unknown targets are ignored.
    pub fn remove_target_mesh(&mut self, target: Entity) {
        if !self.ensure_active("remove_target_mesh") {
            return;
        }
        if let Some(entry) = self.registry.remove(target) {
            despawn_target_entry(&mut self.commands, &entry);
            debug!("Removed projection target {}", target);
        }
    }

    /// Releases every overlay, proxy, the projector entity, the depth and
    /// source images and both materials. Terminal.
    pub fn dispose(&mut self) {
        if !self.ensure_active("dispose") {
            return;
        }

        for entry in self.registry.drain() {
            despawn_target_entry(&mut self.commands, &entry);
        }

        if let Some(resources) = self.resources.as_deref() {
            if let Ok(mut camera) = self.commands.get_entity(resources.camera) {
                camera.try_despawn();
            }
            self.images.remove(&resources.depth.image);
            self.images.remove(&resources.source);
            self.overlay_materials.remove(&resources.overlay_material);
            self.proxy_materials.remove(&resources.proxy_material);
            self.commands.remove_resource::<ProjectorResources>();
        }

        self.next_lifecycle.set(ProjectorLifecycle::Disposed);
        info!("Projector compositor disposed");
    }

    pub fn update_azimuth_deg(&mut self, deg: f32) {
        if self.ensure_active("update_azimuth_deg") {
            self.state.set_azimuth_deg(deg);
        }
    }

    pub fn update_elevation_deg(&mut self, deg: f32) {
        if self.ensure_active("update_elevation_deg") {
            self.state.set_elevation_deg(deg);
        }
    }

    pub fn update_roll_deg(&mut self, deg: f32) {
        if self.ensure_active("update_roll_deg") {
            self.state.set_roll_deg(deg);
        }
    }

    /// Clamped to [0,1].
    pub fn update_opacity(&mut self, opacity: f32) {
        if self.ensure_active("update_opacity") {
            self.uniforms.set_opacity(opacity);
        }
    }

    pub fn update_intensity(&mut self, intensity: f32) {
        if self.ensure_active("update_intensity") {
            self.uniforms.set_intensity(intensity);
        }
    }

    pub fn set_depth_bias(&mut self, bias: f32) {
        if self.ensure_active("set_depth_bias") {
            self.uniforms.set_depth_bias(bias);
        }
    }

    pub fn set_edge_feather(&mut self, width: f32) {
        if self.ensure_active("set_edge_feather") {
            self.uniforms.set_edge_feather(width);
        }
    }

    /// Swaps the projected image, e.g. for a decoded video frame. The host keeps
    /// ownership of `source`. The initial image is still released on `dispose`.
    pub fn set_source_texture(&mut self, source: Handle<Image>) {
        if self.ensure_active("set_source_texture") {
            self.uniforms.source_texture = source;
        }
    }

    pub fn opacity(&self) -> f32 {
        self.uniforms.opacity()
    }

    pub fn state(&self) -> &ProjectorState {
        &self.state
    }

    pub fn target_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_registered(&self, target: Entity) -> bool {
        self.registry.contains(target)
    }

    /// Registered entries whose target entity has been despawned.
    pub fn stale_targets(&self) -> Vec<TargetEntry> {
        stale_entries(&self.registry, self.entities)
    }
}
