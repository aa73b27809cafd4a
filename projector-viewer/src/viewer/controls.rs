use bevy::prelude::*;
use projector_compositor::ProjectorCompositor;

use super::scene::ToggleTarget;

/// Degrees per second while an orientation key is held.
const ANGLE_RATE: f32 = 45.0;
/// Opacity change per second while `-` or `=` is held.
const OPACITY_RATE: f32 = 0.5;

#[derive(Component)]
pub struct StatusText;

fn axis(keyboard: &ButtonInput<KeyCode>, negative: KeyCode, positive: KeyCode) -> f32 {
    keyboard.pressed(positive) as i32 as f32 - keyboard.pressed(negative) as i32 as f32
}

/// ←/→ azimuth, ↑/↓ elevation, Q/E roll, -/= opacity.
pub fn projector_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut compositor: ProjectorCompositor,
) {
    if !compositor.is_active() {
        return;
    }

    let step = time.delta_secs();
    let orientation = *compositor.state().orientation();

    let azimuth = axis(&keyboard, KeyCode::ArrowLeft, KeyCode::ArrowRight);
    if azimuth != 0.0 {
        compositor.update_azimuth_deg(orientation.azimuth_deg + azimuth * ANGLE_RATE * step);
    }

    let elevation = axis(&keyboard, KeyCode::ArrowDown, KeyCode::ArrowUp);
    if elevation != 0.0 {
        let next = (orientation.elevation_deg + elevation * ANGLE_RATE * step).clamp(-89.0, 89.0);
        compositor.update_elevation_deg(next);
    }

    let roll = axis(&keyboard, KeyCode::KeyQ, KeyCode::KeyE);
    if roll != 0.0 {
        compositor.update_roll_deg(orientation.roll_deg + roll * ANGLE_RATE * step);
    }

    let opacity = axis(&keyboard, KeyCode::Minus, KeyCode::Equal);
    if opacity != 0.0 {
        let next = compositor.opacity() + opacity * OPACITY_RATE * step;
        compositor.update_opacity(next);
    }
}

/// Space toggles the sphere's registration, Esc disposes the compositor.
pub fn registry_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    toggles: Query<Entity, With<ToggleTarget>>,
    mut compositor: ProjectorCompositor,
) {
    if !compositor.is_active() {
        return;
    }

    if keyboard.just_pressed(KeyCode::Space) {
        for target in &toggles {
            if compositor.is_registered(target) {
                compositor.remove_target_mesh(target);
            } else {
                compositor.add_target_mesh(target);
            }
        }
    }

    if keyboard.just_pressed(KeyCode::Escape) {
        compositor.dispose();
    }
}

pub fn spawn_status_text(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 15.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        StatusText,
    ));
}

pub fn update_status_text(
    compositor: ProjectorCompositor,
    mut texts: Query<&mut Text, With<StatusText>>,
) {
    let status = if compositor.is_active() {
        let o = compositor.state().orientation();
        format!(
            "azimuth {:.1}°  elevation {:.1}°  roll {:.1}°  opacity {:.2}  targets {}\n\
             ←/→ azimuth  ↑/↓ elevation  Q/E roll  -/= opacity  Space toggle sphere  Esc dispose",
            o.azimuth_deg,
            o.elevation_deg,
            o.roll_deg,
            compositor.opacity(),
            compositor.target_count()
        )
    } else {
        "projector disposed".to_string()
    };

    for mut text in &mut texts {
        if text.0 != status {
            text.0 = status.clone();
        }
    }
}
