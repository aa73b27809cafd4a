use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};
use constants::render_settings::{DEPTH_CLEAR_TEXEL, DEPTH_PACK_MAX, DEPTH_TEXEL_BYTES};

/// Fixed-resolution depth surface written by the pre-pass.
///
/// Depth is stored as a 24-bit fixed point value packed big-endian into the
/// RGB channels of an `Rgba8Unorm` image, independent of the host renderer's
/// depth buffer convention. Alpha is always 255.
#[derive(Debug, Clone)]
pub struct DepthTarget {
    pub image: Handle<Image>,
    size: UVec2,
}

impl DepthTarget {
    /// Allocates the surface. The resolution is fixed for the lifetime of the target.
    pub fn new(images: &mut Assets<Image>, size: u32) -> Self {
        let image = images.add(create_depth_image(size));
        Self {
            image,
            size: UVec2::splat(size),
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }
}

/// Cleared `Rgba8Unorm` image usable as both a render attachment and a sampled texture.
pub fn create_depth_image(size: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &DEPTH_CLEAR_TEXEL,
        TextureFormat::Rgba8Unorm,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage = TextureUsages::TEXTURE_BINDING
        | TextureUsages::RENDER_ATTACHMENT
        | TextureUsages::COPY_DST
        | TextureUsages::COPY_SRC;
    image.sampler = ImageSampler::nearest();
    image
}

/// Packs depth in [0,1] into an RGBA8 texel. Mirrors `pack_depth` in the WGSL shaders.
pub fn pack_depth(depth: f32) -> [u8; 4] {
    let fixed = (depth.clamp(0.0, 1.0) as f64 * DEPTH_PACK_MAX as f64).round() as u32;
    [
        ((fixed >> 16) & 0xFF) as u8,
        ((fixed >> 8) & 0xFF) as u8,
        (fixed & 0xFF) as u8,
        255,
    ]
}

/// Inverse of [`pack_depth`]. Alpha is ignored.
pub fn unpack_depth(texel: [u8; 4]) -> f32 {
    let fixed = ((texel[0] as u32) << 16) | ((texel[1] as u32) << 8) | texel[2] as u32;
    fixed as f32 / DEPTH_PACK_MAX as f32
}

/// Texel coordinate for a texture coordinate, matching `textureLoad` with
/// clamped `floor(uv * size)` in the overlay shader.
pub fn texel_coord(tex_uv: Vec2, size: UVec2) -> UVec2 {
    let max = (size.as_vec2() - 1.0).max(Vec2::ZERO);
    (tex_uv * size.as_vec2()).floor().clamp(Vec2::ZERO, max).as_uvec2()
}

/// Reads the packed depth nearest to `tex_uv`. Returns 1.0 (far) when the
/// image holds no CPU-side data.
pub fn sample_depth(image: &Image, tex_uv: Vec2) -> f32 {
    let size = image.size();
    let Some(data) = image.data.as_ref() else {
        return 1.0;
    };

    let texel = texel_coord(tex_uv, size);
    let offset = (texel.y * size.x + texel.x) as usize * DEPTH_TEXEL_BYTES;
    match data.get(offset..offset + DEPTH_TEXEL_BYTES) {
        Some(bytes) => unpack_depth([bytes[0], bytes[1], bytes[2], bytes[3]]),
        None => 1.0,
    }
}

/// Resets every texel to the far-plane clear value.
pub fn clear_depth(image: &mut Image) {
    if let Some(data) = image.data.as_mut() {
        if let Ok(texels) = bytemuck::try_cast_slice_mut::<u8, [u8; 4]>(data.as_mut_slice()) {
            texels.fill(DEPTH_CLEAR_TEXEL);
        }
    }
}
