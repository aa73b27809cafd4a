use bevy::pbr::{MaterialPipeline, MaterialPipelineKey};
use bevy::render::mesh::MeshVertexBufferLayoutRef;
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, ShaderRef, ShaderType, SpecializedMeshPipelineError,
};
use bevy::{prelude::*, reflect::TypePath};

use super::composition::CompositionUniforms;
use crate::camera::projector_camera::ProjectorState;
use crate::engine::lifecycle::ProjectorResources;

pub const OVERLAY_SHADER_PATH: &str =
    "embedded://projector_compositor/shaders/projector_overlay.wgsl";
pub const DEPTH_SHADER_PATH: &str = "embedded://projector_compositor/shaders/projector_depth.wgsl";

/// Constant depth bias applied to overlays, in depth buffer units.
const OVERLAY_DEPTH_BIAS: i32 = 8;
const OVERLAY_SLOPE_BIAS: f32 = 1.0;

#[derive(Debug, Clone, Copy, ShaderType)]
#[repr(C)]
pub struct ProjectorOverlayUniform {
    pub projector_matrix: Mat4,
    pub intensity: f32,
    pub opacity: f32,
    pub depth_bias: f32,
    pub edge_feather: f32,
}

impl Default for ProjectorOverlayUniform {
    fn default() -> Self {
        Self::from(&CompositionUniforms::default())
    }
}

impl From<&CompositionUniforms> for ProjectorOverlayUniform {
    fn from(uniforms: &CompositionUniforms) -> Self {
        Self {
            projector_matrix: uniforms.projector_matrix(),
            intensity: uniforms.intensity(),
            opacity: uniforms.opacity(),
            depth_bias: uniforms.depth_bias(),
            edge_feather: uniforms.edge_feather(),
        }
    }
}

/// Overlay material drawn over every registered target.
/// One instance is shared by all overlays and rewritten each frame.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct ProjectorOverlayMaterial {
    #[uniform(0)]
    pub uniform: ProjectorOverlayUniform,

    #[texture(1)]
    #[sampler(2)]
    pub source_texture: Handle<Image>,

    /// Packed pre-pass depth, read with `textureLoad`.
    #[texture(3)]
    pub depth_texture: Handle<Image>,
}

impl ProjectorOverlayMaterial {
    pub fn new(uniforms: &CompositionUniforms) -> Self {
        Self {
            uniform: uniforms.into(),
            source_texture: uniforms.source_texture.clone(),
            depth_texture: uniforms.depth_texture.clone(),
        }
    }

    /// Copies the current uniforms into the material.
    pub fn apply(&mut self, uniforms: &CompositionUniforms) {
        self.uniform = uniforms.into();
        if self.source_texture != uniforms.source_texture {
            self.source_texture = uniforms.source_texture.clone();
        }
        if self.depth_texture != uniforms.depth_texture {
            self.depth_texture = uniforms.depth_texture.clone();
        }
    }
}

impl Material for ProjectorOverlayMaterial {
    fn fragment_shader() -> ShaderRef {
        OVERLAY_SHADER_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Premultiplied
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        descriptor.label = Some("projector_overlay_pipeline".into());
        if let Some(depth_stencil) = descriptor.depth_stencil.as_mut() {
            // Overlays share geometry with their target, so they must win the
            // depth test against it without ever writing depth themselves.
            depth_stencil.depth_write_enabled = false;
            depth_stencil.bias.constant = OVERLAY_DEPTH_BIAS;
            depth_stencil.bias.slope_scale = OVERLAY_SLOPE_BIAS;
        }
        Ok(())
    }
}

/// Depth-only material for proxies seen by the projector camera.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct DepthProxyMaterial {
    #[uniform(0)]
    pub projector_matrix: Mat4,
}

impl Material for DepthProxyMaterial {
    fn fragment_shader() -> ShaderRef {
        DEPTH_SHADER_PATH.into()
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        descriptor.label = Some("projector_depth_proxy_pipeline".into());
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}

/// Recomputes the projector matrix and pushes it, with the composition
/// scalars, into both shared materials.
pub fn publish_projector_uniforms(
    state: Res<ProjectorState>,
    mut uniforms: ResMut<CompositionUniforms>,
    resources: Option<Res<ProjectorResources>>,
    mut overlay_materials: ResMut<Assets<ProjectorOverlayMaterial>>,
    mut proxy_materials: ResMut<Assets<DepthProxyMaterial>>,
) {
    let Some(resources) = resources else {
        return;
    };

    let projector_matrix = state.projector_matrix();
    uniforms.set_projector_matrix(projector_matrix);
    if uniforms.depth_texture != resources.depth.image {
        uniforms.depth_texture = resources.depth.image.clone();
    }

    if let Some(material) = overlay_materials.get_mut(&resources.overlay_material) {
        material.apply(&uniforms);
    }
    if let Some(material) = proxy_materials.get_mut(&resources.proxy_material) {
        material.projector_matrix = projector_matrix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_uniform_tracks_composition_state() {
        let mut uniforms = CompositionUniforms::default();
        uniforms.set_opacity(0.25);
        uniforms.set_intensity(3.0);
        uniforms.set_projector_matrix(Mat4::from_scale(Vec3::splat(2.0)));

        let mut material = ProjectorOverlayMaterial::new(&CompositionUniforms::default());
        material.apply(&uniforms);

        assert_eq!(material.uniform.opacity, 0.25);
        assert_eq!(material.uniform.intensity, 3.0);
        assert_eq!(material.uniform.projector_matrix, Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(material.alpha_mode(), AlphaMode::Premultiplied);
    }
}
