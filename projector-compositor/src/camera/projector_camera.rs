use bevy::math::Vec3A;
use bevy::prelude::*;
use bevy::render::camera::{CameraProjection, SubCameraView};
use constants::projector::{DEFAULT_ASPECT, DEFAULT_FAR, DEFAULT_FOV_DEG, DEFAULT_NEAR};
use serde::{Deserialize, Serialize};

use super::orientation::{OrientationState, projector_transform};

/// Perspective intrinsics of the projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ProjectorIntrinsics {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectorIntrinsics {
    fn default() -> Self {
        Self {
            fov_deg: DEFAULT_FOV_DEG,
            aspect: DEFAULT_ASPECT,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl ProjectorIntrinsics {
    /// Clip from view with NDC depth in [0,1] (near = 0, far = 1).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Marker for the entity carrying the projector transform.
/// When the GPU pre-pass is active this entity is also the depth camera.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ProjectorCamera;

/// Projector pose and intrinsics.
///
/// The world transform is recomputed by every orientation setter. View,
/// projection and projector matrices are derived on demand and never stored.
#[derive(Resource, Debug, Clone)]
pub struct ProjectorState {
    position: Vec3,
    intrinsics: ProjectorIntrinsics,
    orientation: OrientationState,
    world_transform: Transform,
}

impl ProjectorState {
    pub fn new(position: Vec3, intrinsics: ProjectorIntrinsics, orientation: OrientationState) -> Self {
        Self {
            position,
            intrinsics,
            orientation,
            world_transform: projector_transform(position, &orientation),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn intrinsics(&self) -> &ProjectorIntrinsics {
        &self.intrinsics
    }

    pub fn orientation(&self) -> &OrientationState {
        &self.orientation
    }

    pub fn world_transform(&self) -> Transform {
        self.world_transform
    }

    pub fn set_azimuth_deg(&mut self, deg: f32) {
        self.orientation.set_azimuth(deg);
        self.recompute();
    }

    pub fn set_elevation_deg(&mut self, deg: f32) {
        self.orientation.set_elevation(deg);
        self.recompute();
    }

    pub fn set_roll_deg(&mut self, deg: f32) {
        self.orientation.set_roll(deg);
        self.recompute();
    }

    pub fn set_intrinsics(&mut self, intrinsics: ProjectorIntrinsics) {
        self.intrinsics = intrinsics;
    }

    fn recompute(&mut self) {
        self.world_transform = projector_transform(self.position, &self.orientation);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_transform.compute_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.intrinsics.projection_matrix()
    }

    /// Projection × view: world space to projector clip space.
    pub fn projector_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Bevy camera projection matching this projector's frustum.
    pub fn camera_projection(&self) -> ProjectorProjection {
        ProjectorProjection::from(self.intrinsics)
    }
}

impl Default for ProjectorState {
    fn default() -> Self {
        Self::new(
            constants::projector::DEFAULT_POSITION,
            ProjectorIntrinsics::default(),
            OrientationState::default(),
        )
    }
}

/// Camera projection used by the GPU depth camera.
///
/// Clip-space x/y are identical to `ProjectorIntrinsics::projection_matrix`,
/// depth is reversed (near = 1, far = 0) for Bevy's depth buffer. Viewport
/// resizes are ignored so the configured aspect always wins over the square
/// depth surface.
#[derive(Debug, Clone)]
pub struct ProjectorProjection {
    pub intrinsics: ProjectorIntrinsics,
    perspective: PerspectiveProjection,
}

impl From<ProjectorIntrinsics> for ProjectorProjection {
    fn from(intrinsics: ProjectorIntrinsics) -> Self {
        Self {
            intrinsics,
            perspective: PerspectiveProjection {
                fov: intrinsics.fov_deg.to_radians(),
                aspect_ratio: intrinsics.aspect,
                near: intrinsics.near,
                far: intrinsics.far,
            },
        }
    }
}

impl CameraProjection for ProjectorProjection {
    fn get_clip_from_view(&self) -> Mat4 {
        let i = &self.intrinsics;
        Mat4::perspective_rh(i.fov_deg.to_radians(), i.aspect, i.far, i.near)
    }

    fn get_clip_from_view_for_sub(&self, _sub_view: &SubCameraView) -> Mat4 {
        self.get_clip_from_view()
    }

    fn update(&mut self, _width: f32, _height: f32) {}

    fn far(&self) -> f32 {
        self.intrinsics.far
    }

    fn get_frustum_corners(&self, z_near: f32, z_far: f32) -> [Vec3A; 8] {
        self.perspective.get_frustum_corners(z_near, z_far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(matrix: Mat4, point: Vec3) -> Vec3 {
        matrix.project_point3(point)
    }

    #[test]
    fn defaults_match_documented_values() {
        let intrinsics = ProjectorIntrinsics::default();
        assert_eq!(intrinsics.fov_deg, 30.0);
        assert_eq!(intrinsics.aspect, 1.0);
        assert_eq!(intrinsics.near, 0.5);
        assert_eq!(intrinsics.far, 50.0);
        assert_eq!(ProjectorState::default().position(), Vec3::ZERO);
    }

    #[test]
    fn projector_matrix_maps_near_and_far_to_unit_depth() {
        let state = ProjectorState::default();
        let m = state.projector_matrix();

        // Default aim is +X.
        let near = project(m, Vec3::new(0.5, 0.0, 0.0));
        let far = project(m, Vec3::new(50.0, 0.0, 0.0));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);
        assert!(near.truncate().abs_diff_eq(Vec2::ZERO, 1e-5));
    }

    #[test]
    fn setters_recompute_transform_immediately() {
        let mut state = ProjectorState::default();
        let before = state.projector_matrix();

        state.set_azimuth_deg(90.0);
        assert!(state.world_transform().forward().abs_diff_eq(Vec3::Z, 1e-5));
        assert!(!state.projector_matrix().abs_diff_eq(before, 1e-6));

        state.set_elevation_deg(-90.0);
        assert!(state.world_transform().forward().abs_diff_eq(-Vec3::Y, 1e-4));
    }

    #[test]
    fn reversed_projection_shares_clip_xy() {
        let intrinsics = ProjectorIntrinsics {
            fov_deg: 40.0,
            aspect: 1.6,
            near: 0.3,
            far: 25.0,
        };
        let standard = intrinsics.projection_matrix();
        let reversed = ProjectorProjection::from(intrinsics).get_clip_from_view();

        for point in [
            Vec3::new(0.2, -0.1, -1.0),
            Vec3::new(-3.0, 2.0, -10.0),
            Vec3::new(1.0, 1.0, -24.0),
        ] {
            let a = project(standard, point);
            let b = project(reversed, point);
            assert!(a.truncate().abs_diff_eq(b.truncate(), 1e-5));
            assert!((a.z + b.z - 1.0).abs() < 1e-3, "depth should be mirrored");
        }
    }

    #[test]
    fn projection_ignores_viewport_updates() {
        let mut projection = ProjectorProjection::from(ProjectorIntrinsics {
            aspect: 2.0,
            ..default()
        });
        let before = projection.get_clip_from_view();
        projection.update(512.0, 512.0);
        assert_eq!(projection.get_clip_from_view(), before);
    }
}
