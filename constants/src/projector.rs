use bevy::math::Vec3;

/// Projector position used when none is configured.
pub const DEFAULT_POSITION: Vec3 = Vec3::ZERO;

/// Vertical field of view in degrees.
pub const DEFAULT_FOV_DEG: f32 = 30.0;

pub const DEFAULT_ASPECT: f32 = 1.0;
pub const DEFAULT_NEAR: f32 = 0.5;
pub const DEFAULT_FAR: f32 = 50.0;

pub const DEFAULT_AZIMUTH_DEG: f32 = 0.0;
pub const DEFAULT_ELEVATION_DEG: f32 = 0.0;
pub const DEFAULT_ROLL_DEG: f32 = 0.0;

/// Scalar applied to projected colour only, alpha is unaffected.
pub const DEFAULT_INTENSITY: f32 = 1.0;
pub const DEFAULT_OPACITY: f32 = 1.0;
