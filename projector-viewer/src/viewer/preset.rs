use bevy::prelude::*;
use projector_compositor::ProjectorCompositor;
use projector_compositor::camera::orientation::OrientationState;
use serde::{Deserialize, Serialize};

pub const PRESET_PATH: &str = "presets/projector.preset.json";

/// Live projector parameters loaded from JSON.
#[derive(Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorPreset {
    pub orientation: OrientationState,
    pub opacity: f32,
    pub intensity: f32,
}

impl Default for ProjectorPreset {
    fn default() -> Self {
        Self {
            orientation: OrientationState::default(),
            opacity: constants::projector::DEFAULT_OPACITY,
            intensity: constants::projector::DEFAULT_INTENSITY,
        }
    }
}

impl ProjectorPreset {
    pub fn apply(&self, compositor: &mut ProjectorCompositor) {
        compositor.update_azimuth_deg(self.orientation.azimuth_deg);
        compositor.update_elevation_deg(self.orientation.elevation_deg);
        compositor.update_roll_deg(self.orientation.roll_deg);
        compositor.update_opacity(self.opacity);
        compositor.update_intensity(self.intensity);
    }
}

#[derive(Resource, Default)]
pub struct PresetLoader {
    handle: Handle<ProjectorPreset>,
}

pub fn start_preset_loading(mut loader: ResMut<PresetLoader>, asset_server: Res<AssetServer>) {
    loader.handle = asset_server.load(PRESET_PATH);
}

/// Applies the preset once loaded and again whenever the file changes.
pub fn apply_preset_on_change(
    mut events: EventReader<AssetEvent<ProjectorPreset>>,
    loader: Res<PresetLoader>,
    presets: Res<Assets<ProjectorPreset>>,
    mut compositor: ProjectorCompositor,
) {
    for event in events.read() {
        let (AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id }) = event
        else {
            continue;
        };
        if *id != loader.handle.id() || !compositor.is_active() {
            continue;
        }
        if let Some(preset) = presets.get(*id) {
            debug!("Applying projector preset {:?}", preset);
            preset.apply(&mut compositor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_preset_parses() {
        let json = include_str!("../../assets/presets/projector.preset.json");
        let preset: ProjectorPreset = serde_json::from_str(json).unwrap();
        assert_eq!(preset.orientation.elevation_deg, -12.0);
        assert!((0.0..=1.0).contains(&preset.opacity));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let preset: ProjectorPreset = serde_json::from_str(r#"{ "opacity": 0.3 }"#).unwrap();
        assert_eq!(preset.opacity, 0.3);
        assert_eq!(preset.intensity, 1.0);
        assert_eq!(preset.orientation, OrientationState::default());
    }
}
