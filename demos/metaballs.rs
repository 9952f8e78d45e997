use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_isosurface::{IsoSurface, IsoSurfacePlugin, MetaBallField, ScalarField, SurfaceConfig};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            IsoSurfacePlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, debug)
        .run();
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 100.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(0., 1.5, 4.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let surface = IsoSurface::new(MetaBallField::demo())
        .with_config(
            SurfaceConfig::default()
                .with_step(0.05)
                .with_flip_winding(true),
        )
        .expect("valid surface config");

    commands.spawn((
        surface,
        Transform::from_xyz(0., 1., 0.),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.6, 1.),
            ..Default::default()
        })),
    ));
}

/// Draws the field's bounding box, which follows the balls around.
fn debug(mut gizmos: Gizmos, query: Query<(&IsoSurface, &GlobalTransform)>) {
    for (surface, transform) in query.iter() {
        let bounds = surface.field().bounds();
        let min = transform.translation() + Vec3::new(bounds.min.x, bounds.min.y, bounds.min.z);
        let max = transform.translation() + Vec3::new(bounds.max.x, bounds.max.y, bounds.max.z);

        let corner = |i: u8| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        };
        for a in 0..8u8 {
            for axis in [1u8, 2, 4] {
                if a & axis == 0 {
                    gizmos.line(corner(a), corner(a | axis), Color::WHITE);
                }
            }
        }
    }
}
