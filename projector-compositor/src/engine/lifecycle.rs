use bevy::core_pipeline::tonemapping::{DebandDither, Tonemapping};
use bevy::prelude::*;
use bevy::render::camera::RenderTarget;
use bevy::render::view::RenderLayers;
use constants::render_settings::PROJECTOR_DEPTH_LAYER;

use crate::camera::projector_camera::{ProjectorCamera, ProjectorState};
use crate::config::{DepthPrepassMode, ProjectorConfig};
use crate::registry::target_registry::TargetMaterials;
use crate::render::composition::CompositionUniforms;
use crate::render::depth_target::DepthTarget;
use crate::render::materials::{DepthProxyMaterial, ProjectorOverlayMaterial};
use crate::render::source_texture::load_source_texture;

/// Per-frame update, in order. Runs in `PostUpdate` after transform
/// propagation and before visibility checks, only while the compositor is active.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectorSystems {
    /// Marker registration and stale target tracking.
    Registry,
    /// Copy target transforms onto depth proxies.
    SyncProxies,
    /// Clear and redraw the depth texture.
    DepthPrepass,
    /// Publish the projector matrix and scalars to the materials.
    PublishUniforms,
    /// Copy target transforms onto overlays.
    SyncOverlays,
}

/// constructed → active → disposed. Disposed is terminal. Every compositor
/// system runs under `in_state(ProjectorLifecycle::Active)`.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectorLifecycle {
    #[default]
    Active,
    Disposed,
}

/// Assets and entities owned by the compositor, released by `dispose`.
#[derive(Resource, Debug, Clone)]
pub struct ProjectorResources {
    pub depth: DepthTarget,
    pub source: Handle<Image>,
    pub overlay_material: Handle<ProjectorOverlayMaterial>,
    pub proxy_material: Handle<DepthProxyMaterial>,
    /// Projector entity, also the depth camera on the GPU back-end.
    pub camera: Entity,
}

impl ProjectorResources {
    pub fn target_materials(&self) -> TargetMaterials {
        TargetMaterials {
            overlay: self.overlay_material.clone(),
            proxy: self.proxy_material.clone(),
        }
    }
}

/// Allocates the depth target, source texture and shared materials, and
/// spawns the projector entity.
#[allow(clippy::too_many_arguments)]
pub fn setup_projector(
    mut commands: Commands,
    config: Res<ProjectorConfig>,
    mode: Res<DepthPrepassMode>,
    state: Res<ProjectorState>,
    mut uniforms: ResMut<CompositionUniforms>,
    mut images: ResMut<Assets<Image>>,
    mut overlay_materials: ResMut<Assets<ProjectorOverlayMaterial>>,
    mut proxy_materials: ResMut<Assets<DepthProxyMaterial>>,
    asset_server: Option<Res<AssetServer>>,
) {
    let depth = DepthTarget::new(&mut images, config.depth_size);
    let source = load_source_texture(
        config.source_path.as_deref(),
        asset_server.as_deref(),
        &mut images,
    );

    uniforms.source_texture = source.clone();
    uniforms.depth_texture = depth.image.clone();
    uniforms.set_projector_matrix(state.projector_matrix());

    let overlay_material = overlay_materials.add(ProjectorOverlayMaterial::new(&uniforms));
    let proxy_material = proxy_materials.add(DepthProxyMaterial {
        projector_matrix: state.projector_matrix(),
    });

    let mut projector = commands.spawn((
        Name::new("projector"),
        ProjectorCamera,
        state.world_transform(),
        GlobalTransform::from(state.world_transform()),
    ));

    if *mode == DepthPrepassMode::Gpu {
        projector.insert((
            Camera3d::default(),
            Camera {
                target: RenderTarget::Image(depth.image.clone().into()),
                order: -1,
                hdr: true,
                clear_color: ClearColorConfig::Custom(Color::WHITE),
                ..default()
            },
            Projection::custom(state.camera_projection()),
            Tonemapping::None,
            DebandDither::Disabled,
            Msaa::Off,
            RenderLayers::layer(PROJECTOR_DEPTH_LAYER),
        ));
    }
    let camera = projector.id();

    info!(
        "Projector compositor ready: {}x{} depth target, {:?} pre-pass",
        depth.size().x,
        depth.size().y,
        *mode
    );

    commands.insert_resource(ProjectorResources {
        depth,
        source,
        overlay_material,
        proxy_material,
        camera,
    });
}
