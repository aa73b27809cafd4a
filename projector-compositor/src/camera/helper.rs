use bevy::prelude::*;

use super::projector_camera::ProjectorState;

const FRUSTUM_COLOUR: Color = Color::srgb(1.0, 0.85, 0.2);
const FORWARD_COLOUR: Color = Color::srgb(1.0, 0.2, 0.2);
const UP_COLOUR: Color = Color::srgb(0.2, 1.0, 0.3);

/// World-space frustum corners: near plane then far plane, each ordered
/// bottom-left, bottom-right, top-right, top-left.
pub fn frustum_corners(state: &ProjectorState) -> [Vec3; 8] {
    let world_from_clip = state.projector_matrix().inverse();
    let ndc = [
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ];
    ndc.map(|corner| world_from_clip.project_point3(corner))
}

/// Draws the projector frustum and its forward/up axes.
/// Purely illustrative, nothing reads back from it.
pub fn draw_projector_helper(mut gizmos: Gizmos, state: Res<ProjectorState>) {
    let corners = frustum_corners(&state);
    let apex = state.position();

    for i in 0..4 {
        let next = (i + 1) % 4;
        gizmos.line(corners[i], corners[next], FRUSTUM_COLOUR);
        gizmos.line(corners[i + 4], corners[next + 4], FRUSTUM_COLOUR);
        gizmos.line(apex, corners[i + 4], FRUSTUM_COLOUR);
    }

    let transform = state.world_transform();
    let length = state.intrinsics().near * 2.0;
    gizmos.arrow(apex, apex + *transform.forward() * length, FORWARD_COLOUR);
    gizmos.arrow(apex, apex + *transform.up() * length * 0.5, UP_COLOUR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frustum_far_plane_sits_at_far_distance() {
        let state = ProjectorState::default();
        let corners = frustum_corners(&state);
        let far = state.intrinsics().far;

        // Default projector at the origin aims down +X.
        for corner in &corners[4..] {
            assert!((corner.x - far).abs() < 1e-2);
        }
        for corner in &corners[..4] {
            assert!((corner.x - state.intrinsics().near).abs() < 1e-4);
        }
    }
}
