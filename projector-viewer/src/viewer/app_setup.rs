use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use projector_compositor::{ProjectorCompositorPlugin, ProjectorConfig, ProjectorIntrinsics};

use super::controls::{projector_controls, registry_controls, spawn_status_text, update_status_text};
use super::preset::{PresetLoader, ProjectorPreset, apply_preset_on_change, start_preset_loading};
use super::scene::setup_scene;
use super::window_config::create_window_config;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        // Registers ProjectorPreset as a loadable asset type from *.preset.json files.
        .add_plugins(JsonAssetPlugin::<ProjectorPreset>::new(&["preset.json"]))
        .add_plugins(ProjectorCompositorPlugin::new(create_projector_config()))
        .init_resource::<PresetLoader>();

    app.add_systems(
        Startup,
        (setup_scene, spawn_status_text, start_preset_loading),
    )
    .add_systems(
        Update,
        (
            apply_preset_on_change,
            projector_controls,
            registry_controls,
            update_status_text,
        )
            .chain(),
    );

    app
}

fn create_projector_config() -> ProjectorConfig {
    ProjectorConfig {
        position: [-9.0, 2.5, 0.0],
        intrinsics: ProjectorIntrinsics {
            fov_deg: 35.0,
            aspect: 4.0 / 3.0,
            ..default()
        },
        ..default()
    }
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
