use bevy::prelude::*;
use constants::projector::{DEFAULT_INTENSITY, DEFAULT_OPACITY};
use constants::render_settings::{DEFAULT_DEPTH_BIAS, DEFAULT_EDGE_FEATHER};

use super::depth_target;

/// Values shared by every overlay fragment. Mirrors the overlay material's uniform block.
///
/// Scalars are only reachable through setters: opacity stays in [0,1], depth
/// bias and edge feather never go negative.
#[derive(Resource, Debug, Clone)]
pub struct CompositionUniforms {
    pub source_texture: Handle<Image>,
    pub depth_texture: Handle<Image>,
    projector_matrix: Mat4,
    intensity: f32,
    depth_bias: f32,
    edge_feather: f32,
    opacity: f32,
}

impl Default for CompositionUniforms {
    fn default() -> Self {
        Self::new(
            DEFAULT_INTENSITY,
            DEFAULT_OPACITY,
            DEFAULT_DEPTH_BIAS,
            DEFAULT_EDGE_FEATHER,
        )
    }
}

impl CompositionUniforms {
    pub fn new(intensity: f32, opacity: f32, depth_bias: f32, edge_feather: f32) -> Self {
        let mut uniforms = Self {
            source_texture: Handle::default(),
            depth_texture: Handle::default(),
            projector_matrix: Mat4::IDENTITY,
            intensity: 0.0,
            depth_bias: 0.0,
            edge_feather: 0.0,
            opacity: 0.0,
        };
        uniforms.set_intensity(intensity);
        uniforms.set_opacity(opacity);
        uniforms.set_depth_bias(depth_bias);
        uniforms.set_edge_feather(edge_feather);
        uniforms
    }

    pub fn projector_matrix(&self) -> Mat4 {
        self.projector_matrix
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn depth_bias(&self) -> f32 {
        self.depth_bias
    }

    pub fn edge_feather(&self) -> f32 {
        self.edge_feather
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_projector_matrix(&mut self, matrix: Mat4) {
        self.projector_matrix = matrix;
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    /// Clamped to [0,1]. NaN is treated as fully transparent.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
    }

    pub fn set_depth_bias(&mut self, bias: f32) {
        self.depth_bias = non_negative(bias);
    }

    pub fn set_edge_feather(&mut self, width: f32) {
        self.edge_feather = non_negative(width);
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

/// Premultiplied contribution of one overlay fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedFragment {
    pub color: Vec3,
    pub alpha: f32,
}

/// Where a world point lands in the projector: UV in [0,1]² with +Y at the
/// frustum top, plus normalized depth. `None` when behind the projector or
/// outside its frustum.
pub fn project_point(projector_matrix: Mat4, world_pos: Vec3) -> Option<(Vec2, f32)> {
    let clip = projector_matrix * world_pos.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }

    let uv = clip.truncate().truncate() / clip.w * 0.5 + 0.5;
    if uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 {
        return None;
    }

    // perspective_rh already yields [0,1] depth.
    Some((uv, clip.z / clip.w))
}

/// Texture coordinate for a projector UV. Image row 0 is the frustum top.
pub fn texture_coord(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}

/// Hermite interpolation between `edge0` and `edge1`, as WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Alpha falloff towards the frustum border. 1 everywhere when feathering is off.
pub fn edge_factor(uv: Vec2, edge_feather: f32) -> f32 {
    if edge_feather <= 0.0 {
        return 1.0;
    }
    let d = uv.x.min(1.0 - uv.x).min(uv.y).min(1.0 - uv.y);
    smoothstep(0.0, edge_feather, d)
}

/// CPU reference of the overlay fragment shader.
///
/// `sample_source` returns linear RGBA and `sample_depth` returns the
/// pre-pass depth, both addressed by texture coordinate. Returns `None` for a
/// discarded fragment.
pub fn evaluate_fragment(
    world_pos: Vec3,
    uniforms: &CompositionUniforms,
    sample_source: impl Fn(Vec2) -> Vec4,
    sample_depth: impl Fn(Vec2) -> f32,
) -> Option<ProjectedFragment> {
    let (uv, depth01) = project_point(uniforms.projector_matrix, world_pos)?;
    let tex_uv = texture_coord(uv);
    let color = sample_source(tex_uv);

    let scene_depth01 = sample_depth(tex_uv);
    if depth01 > scene_depth01 + uniforms.depth_bias {
        return None;
    }

    let edge = edge_factor(uv, uniforms.edge_feather);
    Some(ProjectedFragment {
        color: color.truncate() * uniforms.intensity * edge * uniforms.opacity,
        alpha: color.w * edge * uniforms.opacity,
    })
}

/// Bilinear, clamp-to-edge linear RGBA lookup into a CPU-side image, the
/// same filtering the overlay shader gets from the default linear sampler.
/// Texels `Image::get_color_at` cannot read count as transparent black.
pub fn image_color_sampler(image: &Image) -> impl Fn(Vec2) -> Vec4 + '_ {
    let texel = move |x: u32, y: u32| match image.get_color_at(x, y) {
        Ok(color) => {
            let linear = LinearRgba::from(color);
            Vec4::new(linear.red, linear.green, linear.blue, linear.alpha)
        }
        Err(_) => Vec4::ZERO,
    };

    move |tex_uv| {
        let size = image.size().as_vec2();
        let max = (size - 1.0).max(Vec2::ZERO);
        // Texel centres sit at half-integer coordinates.
        let pos = (tex_uv * size - 0.5).clamp(Vec2::ZERO, max);
        let base = pos.floor();
        let t = pos - base;

        let (x0, y0) = (base.x as u32, base.y as u32);
        let x1 = (x0 + 1).min(max.x as u32);
        let y1 = (y0 + 1).min(max.y as u32);
        let top = texel(x0, y0).lerp(texel(x1, y0), t.x);
        let bottom = texel(x0, y1).lerp(texel(x1, y1), t.x);
        top.lerp(bottom, t.y)
    }
}

/// Packed pre-pass depth lookup into a CPU-side depth image.
pub fn image_depth_sampler(image: &Image) -> impl Fn(Vec2) -> f32 + '_ {
    move |tex_uv| depth_target::sample_depth(image, tex_uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::projector_camera::ProjectorState;

    const WHITE: Vec4 = Vec4::ONE;

    fn uniforms(edge_feather: f32) -> CompositionUniforms {
        let mut uniforms = CompositionUniforms::new(1.0, 1.0, 1e-4, edge_feather);
        uniforms.set_projector_matrix(ProjectorState::default().projector_matrix());
        uniforms
    }

    #[test]
    fn occlusion_discards_only_past_the_bias() {
        let u = uniforms(0.0);
        let point = Vec3::new(10.0, 0.0, 0.0);
        let (_, depth01) = project_point(u.projector_matrix(), point).unwrap();
        let bias = u.depth_bias();

        let visible = |scene: f32| evaluate_fragment(point, &u, |_| WHITE, |_| scene);

        assert!(visible(depth01).is_some());
        assert!(visible(depth01 - bias * 0.5).is_some());
        assert!(visible(1.0).is_some());
        assert!(visible(depth01 - bias * 2.0).is_none());
        assert!(visible(0.0).is_none());
    }

    #[test]
    fn behind_and_outside_are_discarded() {
        let u = uniforms(0.0);
        let far = |_: Vec2| 1.0_f32;
        assert!(evaluate_fragment(Vec3::new(-5.0, 0.0, 0.0), &u, |_| WHITE, far).is_none());
        // 30° fov: at x=10 the frustum half-height is ~2.68.
        assert!(evaluate_fragment(Vec3::new(10.0, 4.0, 0.0), &u, |_| WHITE, far).is_none());
        assert!(evaluate_fragment(Vec3::new(10.0, 0.0, -4.0), &u, |_| WHITE, far).is_none());
        assert!(evaluate_fragment(Vec3::new(10.0, 2.0, 0.0), &u, |_| WHITE, far).is_some());
    }

    #[test]
    fn feather_is_zero_at_border_and_one_past_width() {
        let width = 0.05;
        assert_eq!(edge_factor(Vec2::new(0.0, 0.5), width), 0.0);
        assert_eq!(edge_factor(Vec2::new(0.5, 1.0), width), 0.0);
        assert_eq!(edge_factor(Vec2::new(width, 0.5), width), 1.0);
        assert_eq!(edge_factor(Vec2::splat(0.5), width), 1.0);
        assert_eq!(edge_factor(Vec2::new(0.0, 0.0), 0.0), 1.0);

        let mut previous = 0.0;
        for step in 0..=100 {
            let d = step as f32 / 100.0 * width;
            let factor = edge_factor(Vec2::new(d, 0.5), width);
            assert!(factor >= previous, "d={d}");
            previous = factor;
        }
    }

    #[test]
    fn output_is_premultiplied() {
        let mut u = uniforms(0.0);
        u.set_intensity(2.0);
        u.set_opacity(0.5);
        let color = Vec4::new(0.2, 0.4, 0.6, 0.8);

        let fragment =
            evaluate_fragment(Vec3::new(10.0, 0.0, 0.0), &u, |_| color, |_| 1.0).unwrap();
        assert!(fragment.color.abs_diff_eq(Vec3::new(0.2, 0.4, 0.6), 1e-6));
        assert!((fragment.alpha - 0.4).abs() < 1e-6);
    }

    #[test]
    fn frustum_top_samples_first_texture_row() {
        let u = uniforms(0.0);
        let seen = std::cell::Cell::new(Vec2::NAN);
        evaluate_fragment(
            Vec3::new(10.0, 2.5, 0.0),
            &u,
            |tex_uv| {
                seen.set(tex_uv);
                WHITE
            },
            |_| 1.0,
        );
        assert!(seen.get().y < 0.1);
    }

    #[test]
    fn color_sampler_filters_between_texel_centres() {
        use bevy::asset::RenderAssetUsages;
        use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

        let image = Image::new(
            Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
            TextureFormat::Rgba8Unorm,
            RenderAssetUsages::default(),
        );
        let sample = image_color_sampler(&image);

        // Texel centres return the texel itself, edges clamp.
        assert!(sample(Vec2::new(0.25, 0.5)).abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-6));
        assert!(sample(Vec2::new(0.0, 0.0)).abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-6));
        assert!(sample(Vec2::new(1.0, 1.0)).abs_diff_eq(Vec4::ONE, 1e-6));
        // Halfway between the two centres.
        assert!(sample(Vec2::new(0.5, 0.5)).abs_diff_eq(Vec4::new(0.5, 0.5, 0.5, 1.0), 1e-6));
    }

    #[test]
    fn setters_clamp_scalars() {
        let mut u = CompositionUniforms::default();
        u.set_opacity(-1.0);
        assert_eq!(u.opacity(), 0.0);
        u.set_opacity(2.0);
        assert_eq!(u.opacity(), 1.0);
        u.set_opacity(0.5);
        assert_eq!(u.opacity(), 0.5);

        u.set_depth_bias(-1.0);
        u.set_edge_feather(f32::NAN);
        assert_eq!(u.depth_bias(), 0.0);
        assert_eq!(u.edge_feather(), 0.0);
    }
}
