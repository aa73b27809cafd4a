use bevy::prelude::*;
use constants::projector::{DEFAULT_AZIMUTH_DEG, DEFAULT_ELEVATION_DEG, DEFAULT_ROLL_DEG};
use serde::{Deserialize, Serialize};

/// Projector aim expressed as azimuth/elevation/roll in degrees.
/// Mutated only through its setters; the owning `ProjectorState` recomputes
/// the projector transform after every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct OrientationState {
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub roll_deg: f32,
}

impl Default for OrientationState {
    fn default() -> Self {
        Self {
            azimuth_deg: DEFAULT_AZIMUTH_DEG,
            elevation_deg: DEFAULT_ELEVATION_DEG,
            roll_deg: DEFAULT_ROLL_DEG,
        }
    }
}

impl OrientationState {
    pub fn new(azimuth_deg: f32, elevation_deg: f32, roll_deg: f32) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
            roll_deg,
        }
    }

    pub fn set_azimuth(&mut self, deg: f32) {
        self.azimuth_deg = deg;
    }

    pub fn set_elevation(&mut self, deg: f32) {
        self.elevation_deg = deg;
    }

    pub fn set_roll(&mut self, deg: f32) {
        self.roll_deg = deg;
    }

    /// Unit look direction for the current azimuth/elevation.
    pub fn look_direction(&self) -> Vec3 {
        look_direction(self.azimuth_deg, self.elevation_deg)
    }
}

/// Spherical to Cartesian conversion of the projector aim.
/// `(cos(el)·cos(az), sin(el), cos(el)·sin(az))`, never zero length.
pub fn look_direction(azimuth_deg: f32, elevation_deg: f32) -> Vec3 {
    let az = azimuth_deg.to_radians();
    let el = elevation_deg.to_radians();
    Vec3::new(el.cos() * az.cos(), el.sin(), el.cos() * az.sin())
}

/// World transform of a projector at `position` aimed by `orientation`.
///
/// Look-at is applied first with world +Y as up, then roll rotates about the
/// camera's local view axis so it never disturbs azimuth or elevation.
pub fn projector_transform(position: Vec3, orientation: &OrientationState) -> Transform {
    let dir = orientation.look_direction();
    let mut transform = Transform::from_translation(position).looking_at(position + dir, Vec3::Y);
    transform.rotate_local_z(orientation.roll_deg.to_radians());
    transform
}
