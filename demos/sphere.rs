use bevy::{
    pbr::wireframe::{Wireframe, WireframeConfig},
    prelude::*,
};
use bevy_isosurface::{IsoSurface, IsoSurfacePlugin, SphereField, SurfaceConfig, types::Point};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            // #[cfg(not(target_arch = "wasm32"))]
            bevy::pbr::wireframe::WireframePlugin::default(),
            IsoSurfacePlugin::default(),
        ))
        .insert_resource(WireframeConfig {
            global: true,
            ..Default::default()
        })
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    bevy::log::info!("Sphere Example");

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-2.4, 2.8, -2.4).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let surface = IsoSurface::new(SphereField::new(Point::origin(), 1.0))
        .with_config(SurfaceConfig::default().with_flip_winding(true))
        .expect("valid surface config");

    commands.spawn((surface, Wireframe));
}
