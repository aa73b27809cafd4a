//! Projector camera and orientation control.
//!
//! Converts azimuth/elevation/roll into a projector world transform and
//! derives the view, projection and combined projector matrices from it.

/// Debug gizmo drawing the projector frustum.
pub mod helper;

/// Azimuth/elevation/roll state and the look-at + roll transform derivation.
pub mod orientation;

/// Projector intrinsics, pose resource and the Bevy camera projection used by
/// the GPU depth camera.
pub mod projector_camera;
