use std::collections::HashSet;

use bevy::prelude::*;

use super::depth_target::clear_depth;
use super::software_raster::rasterize_mesh;
use crate::camera::projector_camera::{ProjectorCamera, ProjectorState};
use crate::config::DepthPrepassMode;
use crate::engine::lifecycle::ProjectorResources;
use crate::error::ProjectorError;
use crate::registry::target_registry::DepthProxy;

/// Depth pass over every proxy from the projector's viewpoint.
///
/// The projector entity always follows `ProjectorState`. On the GPU back-end
/// that entity is the depth camera and the draw happens in the render world
/// later this frame. On the software back-end the image is cleared and every
/// proxy is rasterized here.
#[allow(clippy::type_complexity)]
pub fn render_depth_prepass(
    mode: Res<DepthPrepassMode>,
    state: Res<ProjectorState>,
    resources: Option<Res<ProjectorResources>>,
    mut cameras: Query<
        (&mut Transform, &mut GlobalTransform, Option<&mut Projection>),
        With<ProjectorCamera>,
    >,
    proxies: Query<(Entity, &Mesh3d, &GlobalTransform), (With<DepthProxy>, Without<ProjectorCamera>)>,
    meshes: Res<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut reported: Local<HashSet<Entity>>,
) {
    let Some(resources) = resources else {
        return;
    };

    if let Ok((mut transform, mut global, projection)) = cameras.get_mut(resources.camera) {
        transform.set_if_neq(state.world_transform());
        global.set_if_neq(GlobalTransform::from(state.world_transform()));
        if let Some(mut projection) = projection {
            if state.is_changed() {
                *projection = Projection::custom(state.camera_projection());
            }
        }
    }

    if *mode != DepthPrepassMode::Software {
        return;
    }

    let Some(image) = images.get_mut(&resources.depth.image) else {
        return;
    };
    clear_depth(image);

    let projector_matrix = state.projector_matrix();
    for (entity, mesh, transform) in &proxies {
        let result = match meshes.get(&mesh.0) {
            Some(mesh) => rasterize_mesh(
                image,
                projector_matrix * transform.compute_matrix(),
                mesh,
                entity,
            )
            .map(|_| ()),
            None => Err(ProjectorError::MeshNotLoaded(entity)),
        };

        match result {
            Ok(()) => {
                reported.remove(&entity);
            }
            Err(err) => {
                if reported.insert(entity) {
                    warn!("Skipping depth proxy in pre-pass: {}", err);
                }
            }
        }
    }
}
