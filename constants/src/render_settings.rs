/// Side length of the square depth pre-pass surface (pixels)
pub const DEFAULT_DEPTH_SIZE: u32 = 1024;

/// Tolerance added to the occlusion comparison in [0,1] depth units
pub const DEFAULT_DEPTH_BIAS: f32 = 1e-4;

/// Width of the edge falloff band in projector UV units
pub const DEFAULT_EDGE_FEATHER: f32 = 0.05;

/// Render layer shared by the depth proxies and the projector depth camera.
/// Main scene cameras stay on layer 0 and never see the proxies.
pub const PROJECTOR_DEPTH_LAYER: usize = 7;

/// Largest value representable by the 24-bit RGB depth packing
pub const DEPTH_PACK_MAX: u32 = 0x00FF_FFFF;

/// Cleared texel value, unpacks to depth 1.0 (far plane)
pub const DEPTH_CLEAR_TEXEL: [u8; 4] = [255, 255, 255, 255];

/// Bytes per depth texel (Rgba8Unorm)
pub const DEPTH_TEXEL_BYTES: usize = 4;
