use bevy::prelude::*;
use bevy_isosurface::{
    Aabb, IsoSurface, IsoSurfacePlugin, ScalarField, SurfaceConfig,
    types::{Point, Value},
};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use noiz::prelude::*;

type BlobNoise = Noise<
    LayeredNoise<
        Normed<f32>,
        Persistence,
        Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
    >,
>;

/// A sphere whose surface is pushed in and out by layered gradient noise.
///
/// The noise is sampled at a point drifting along +Y each update, so the blob
/// boils in place.
struct NoisyBlob {
    noise: BlobNoise,
    radius: Value,
    roughness: Value,
    drift: Value,
}

impl ScalarField for NoisyBlob {
    fn value(&self, p: &Point) -> Value {
        let n: f32 = self
            .noise
            .sample_for(Vec3::new(p.x, p.y + self.drift, p.z));
        self.radius * self.radius - p.coords.norm_squared() + self.roughness * n
    }

    fn bounds(&self) -> Aabb {
        // Noise is normalised to [-1, 1], so the positive region never passes this radius.
        let reach = (self.radius * self.radius + self.roughness).sqrt();
        Aabb::around(Point::origin(), reach)
    }

    fn update(&mut self) {
        self.drift += 0.01;
    }
}

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            IsoSurfacePlugin::default(),
            PanOrbitCameraPlugin,
            #[cfg(not(target_arch = "wasm32"))]
            bevy::pbr::wireframe::WireframePlugin::default(),
        ))
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(0., 2., 5.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let mut noise = BlobNoise::default();
    noise.set_frequency(1.5);

    let blob = NoisyBlob {
        noise,
        radius: 1.2,
        roughness: 0.4,
        drift: 0.,
    };

    let surface = IsoSurface::new(blob)
        .with_config(
            SurfaceConfig::default()
                .with_step(0.06)
                .with_flip_winding(true),
        )
        .expect("valid surface config");

    commands.spawn((
        surface,
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(1., 0.4, 0.2),
            ..Default::default()
        })),
    ));
}
