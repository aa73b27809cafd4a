use bevy::prelude::*;
use projector_compositor::ProjectionTarget;

/// The one target Space toggles in and out of the registry.
#[derive(Component)]
pub struct ToggleTarget;

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ground = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.55, 0.58),
        perceptual_roughness: 0.9,
        ..default()
    });
    let props = materials.add(StandardMaterial {
        base_color: Color::srgb(0.8, 0.78, 0.74),
        ..default()
    });

    commands.spawn((
        Name::new("ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(24.0, 24.0))),
        MeshMaterial3d(ground),
        Transform::from_xyz(0.0, -1.0, 0.0),
        ProjectionTarget,
    ));

    let cube = meshes.add(Cuboid::new(1.5, 1.5, 1.5));
    for (i, position) in [
        Vec3::new(0.0, -0.25, 0.0),
        Vec3::new(2.0, -0.25, -2.5),
        Vec3::new(-1.5, 0.25, 2.0),
    ]
    .into_iter()
    .enumerate()
    {
        commands.spawn((
            Name::new(format!("box_{i}")),
            Mesh3d(cube.clone()),
            MeshMaterial3d(props.clone()),
            Transform::from_translation(position).with_rotation(Quat::from_rotation_y(0.4 * i as f32)),
            ProjectionTarget,
        ));
    }

    commands.spawn((
        Name::new("sphere"),
        Mesh3d(meshes.add(Sphere::new(0.9).mesh().uv(48, 24))),
        MeshMaterial3d(props),
        Transform::from_xyz(-3.0, -0.1, -1.0),
        ProjectionTarget,
        ToggleTarget,
    ));

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 4_000.0,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(6.0, 6.0, 11.0).looking_at(Vec3::new(-1.0, -0.5, 0.0), Vec3::Y),
    ));
}
