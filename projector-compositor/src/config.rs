use bevy::prelude::*;
use constants::projector::{DEFAULT_INTENSITY, DEFAULT_OPACITY};
use constants::render_settings::{DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_SIZE, DEFAULT_EDGE_FEATHER};
use serde::{Deserialize, Serialize};

use crate::camera::orientation::OrientationState;
use crate::camera::projector_camera::{ProjectorIntrinsics, ProjectorState};

/// Back-end producing the projector depth texture.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum DepthPrepassMode {
    /// `Gpu` when a render sub-app exists, `Software` otherwise.
    #[default]
    Auto,
    /// Offscreen camera rendering the depth proxies.
    Gpu,
    /// CPU rasterizer writing the depth image directly.
    Software,
}

impl DepthPrepassMode {
    /// Concrete back-end for an app. `Gpu` cannot run without a renderer and
    /// falls back to `Software`.
    pub fn resolve(self, rendering: bool) -> Self {
        match (self, rendering) {
            (Self::Software, _) | (_, false) => Self::Software,
            (Self::Auto | Self::Gpu, true) => Self::Gpu,
        }
    }
}

/// Construction options for the compositor. Every field has a default.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Projector position in world space, fixed for the compositor's lifetime.
    pub position: [f32; 3],
    pub intrinsics: ProjectorIntrinsics,
    pub orientation: OrientationState,
    /// Side of the square depth texture in texels.
    pub depth_size: u32,
    pub intensity: f32,
    pub opacity: f32,
    pub depth_bias: f32,
    pub edge_feather: f32,
    pub show_helper: bool,
    pub depth_prepass: DepthPrepassMode,
    /// Image to project, loaded through the asset server. A generated test
    /// card is used when unset.
    pub source_path: Option<String>,
    /// Drop registry entries whose target entity no longer exists.
    pub prune_despawned_targets: bool,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            position: constants::projector::DEFAULT_POSITION.to_array(),
            intrinsics: ProjectorIntrinsics::default(),
            orientation: OrientationState::default(),
            depth_size: DEFAULT_DEPTH_SIZE,
            intensity: DEFAULT_INTENSITY,
            opacity: DEFAULT_OPACITY,
            depth_bias: DEFAULT_DEPTH_BIAS,
            edge_feather: DEFAULT_EDGE_FEATHER,
            show_helper: true,
            depth_prepass: DepthPrepassMode::Auto,
            source_path: None,
            prune_despawned_targets: false,
        }
    }
}

impl ProjectorConfig {
    pub fn projector_state(&self) -> ProjectorState {
        ProjectorState::new(Vec3::from_array(self.position), self.intrinsics, self.orientation)
    }
}
