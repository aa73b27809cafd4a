//! Projective texturing for Bevy.
//!
//! A virtual projector reprojects a source image onto registered meshes,
//! occluded by a depth pre-pass from the projector's viewpoint and feathered
//! towards the frustum edges.

use bevy::asset::embedded_asset;
use bevy::gizmos::config::GizmoConfigStore;
use bevy::prelude::*;
use bevy::render::RenderApp;
use bevy::render::view::VisibilitySystems;
use bevy::transform::TransformSystem;

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod render;

pub use crate::camera::projector_camera::{ProjectorIntrinsics, ProjectorState};
pub use crate::config::{DepthPrepassMode, ProjectorConfig};
pub use crate::engine::compositor::ProjectorCompositor;
pub use crate::engine::lifecycle::{ProjectorLifecycle, ProjectorResources, ProjectorSystems};
pub use crate::error::ProjectorError;
pub use crate::registry::target_registry::{ProjectionTarget, TargetEntry, TargetRegistry};
pub use crate::render::composition::{CompositionUniforms, ProjectedFragment, evaluate_fragment};

use crate::camera::helper::draw_projector_helper;
use crate::engine::lifecycle::setup_projector;
use crate::registry::target_systems::{
    register_marked_targets, sync_overlay_transforms, sync_proxy_transforms, track_stale_targets,
    unregister_unmarked_targets,
};
use crate::render::depth_prepass::render_depth_prepass;
use crate::render::materials::{
    DepthProxyMaterial, ProjectorOverlayMaterial, publish_projector_uniforms,
};

/// Adds the compositor to an app. Add after `DefaultPlugins` (or at least
/// `AssetPlugin`, `TransformPlugin` and `StatesPlugin`).
#[derive(Default)]
pub struct ProjectorCompositorPlugin {
    pub config: ProjectorConfig,
}

impl ProjectorCompositorPlugin {
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }
}

impl Plugin for ProjectorCompositorPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone();
        let rendering = app.get_sub_app(RenderApp).is_some();
        let mode = config.depth_prepass.resolve(rendering);

        if rendering {
            embedded_asset!(app, "shaders/projector_overlay.wgsl");
            embedded_asset!(app, "shaders/projector_depth.wgsl");
            app.add_plugins((
                MaterialPlugin::<ProjectorOverlayMaterial> {
                    prepass_enabled: false,
                    shadows_enabled: false,
                    ..default()
                },
                MaterialPlugin::<DepthProxyMaterial> {
                    prepass_enabled: false,
                    shadows_enabled: false,
                    ..default()
                },
            ));
        } else {
            info!("No render sub-app, projector depth pre-pass runs in software");
            app.init_asset::<ProjectorOverlayMaterial>()
                .init_asset::<DepthProxyMaterial>();
        }

        app.insert_resource(config.projector_state())
            .insert_resource(CompositionUniforms::new(
                config.intensity,
                config.opacity,
                config.depth_bias,
                config.edge_feather,
            ))
            .insert_resource(mode)
            .insert_resource(config)
            .init_resource::<TargetRegistry>()
            .init_state::<ProjectorLifecycle>()
            .configure_sets(
                PostUpdate,
                (
                    ProjectorSystems::Registry,
                    ProjectorSystems::SyncProxies,
                    ProjectorSystems::DepthPrepass,
                    ProjectorSystems::PublishUniforms,
                    ProjectorSystems::SyncOverlays,
                )
                    .chain()
                    .after(TransformSystem::TransformPropagate)
                    .before(VisibilitySystems::CheckVisibility)
                    .run_if(in_state(ProjectorLifecycle::Active)),
            )
            .add_systems(PreStartup, setup_projector)
            .add_systems(
                PostUpdate,
                (
                    (
                        register_marked_targets,
                        unregister_unmarked_targets,
                        track_stale_targets,
                    )
                        .chain()
                        .in_set(ProjectorSystems::Registry),
                    sync_proxy_transforms.in_set(ProjectorSystems::SyncProxies),
                    render_depth_prepass.in_set(ProjectorSystems::DepthPrepass),
                    publish_projector_uniforms.in_set(ProjectorSystems::PublishUniforms),
                    sync_overlay_transforms.in_set(ProjectorSystems::SyncOverlays),
                ),
            )
            .add_systems(
                Update,
                draw_projector_helper.run_if(
                    resource_exists::<GizmoConfigStore>
                        .and(in_state(ProjectorLifecycle::Active))
                        .and(|config: Res<ProjectorConfig>| config.show_helper),
                ),
            );
    }
}
