use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};
use tracing::warn;

use crate::{
    builder::{SurfaceBuilder, SurfaceConfig},
    error::Result,
    field::ScalarField,
    mesh::SurfaceMesh,
};

/// System sets for the per-frame surface pipeline.
///
/// Use these to order your own systems relative to tessellation:
///
/// ```rust,ignore
/// // Run after the new geometry exists but before it's uploaded, e.g. for colliders:
/// app.add_systems(Update, build_collider.after(IsoSurfaceSet::Rebuild)
///                                       .before(IsoSurfaceSet::Upload));
/// ```
///
/// ```text
/// IsoSurfaceSet::Rebuild  →  [your systems]  →  IsoSurfaceSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum IsoSurfaceSet {
    /// Advances each field and retessellates it.
    Rebuild,
    /// Uploads freshly built surfaces into a Bevy [`Mesh3d`].
    Upload,
}

/// A scalar field whose zero-level-set is rendered as a mesh on this entity.
///
/// The field is updated and fully retessellated every frame it is scheduled.
#[derive(Component)]
#[require(Transform)]
pub struct IsoSurface {
    field: Box<dyn ScalarField + Send + Sync>,
    builder: SurfaceBuilder,
    needs_upload: bool,
    /// Frame of the last rebuild attempt; `0` means never.
    last_attempt: u64,
}

impl IsoSurface {
    /// Wraps `field` with the default [`SurfaceConfig`].
    pub fn new(field: impl ScalarField + Send + Sync + 'static) -> Self {
        Self {
            field: Box::new(field),
            builder: SurfaceBuilder::default(),
            needs_upload: false,
            last_attempt: 0,
        }
    }

    /// Replaces the tessellation settings.
    ///
    /// Returns an error if `config` is invalid.
    pub fn with_config(mut self, config: SurfaceConfig) -> Result<Self> {
        self.builder = SurfaceBuilder::new(config)?;
        Ok(self)
    }

    pub fn field(&self) -> &(dyn ScalarField + Send + Sync) {
        self.field.as_ref()
    }

    pub fn field_mut(&mut self) -> &mut (dyn ScalarField + Send + Sync) {
        self.field.as_mut()
    }

    /// The last successfully built mesh.
    pub fn mesh(&self) -> &SurfaceMesh {
        self.builder.mesh()
    }

    /// Updates the field and rebuilds the mesh. Keeps the previous mesh on failure.
    pub fn rebuild(&mut self) -> Result<&SurfaceMesh> {
        let mesh = self.builder.rebuild(&mut self.field)?;
        self.needs_upload = true;
        Ok(mesh)
    }
}

/// Runtime configuration for the surface pipeline.
///
/// Inserted as a resource by [`IsoSurfacePlugin`]. Modify it at any time to change behaviour:
///
/// ```rust,ignore
/// fn my_system(mut config: ResMut<IsoSurfaceConfig>) {
///     config.max_surfaces_per_frame = 1;
/// }
/// ```
#[derive(Resource)]
pub struct IsoSurfaceConfig {
    /// Maximum number of surfaces rebuilt per frame.
    ///
    /// Surfaces past the limit keep their previous mesh that frame. Default: `4`.
    pub max_surfaces_per_frame: usize,
}

impl Default for IsoSurfaceConfig {
    fn default() -> Self {
        Self {
            max_surfaces_per_frame: 4,
        }
    }
}

/// Bevy plugin that keeps every [`IsoSurface`] tessellated.
///
/// When the `auto_rebuild` feature is enabled the systems run every `Update`:
///
/// ```text
/// IsoSurface
///   → field.update() + retessellate   (IsoSurfaceSet::Rebuild)
///   → [your systems here]
///   → Mesh3d inserted / overwritten   (IsoSurfaceSet::Upload)
/// ```
pub struct IsoSurfacePlugin {
    /// Initial value for [`IsoSurfaceConfig::max_surfaces_per_frame`].
    pub max_surfaces_per_frame: usize,
}

impl Default for IsoSurfacePlugin {
    fn default() -> Self {
        Self {
            max_surfaces_per_frame: IsoSurfaceConfig::default().max_surfaces_per_frame,
        }
    }
}

impl Plugin for IsoSurfacePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(IsoSurfaceConfig {
            max_surfaces_per_frame: self.max_surfaces_per_frame,
        });

        #[cfg(feature = "auto_rebuild")]
        app.configure_sets(
            Update,
            (IsoSurfaceSet::Rebuild, IsoSurfaceSet::Upload).chain(),
        )
        .add_systems(
            Update,
            (
                rebuild_surfaces.in_set(IsoSurfaceSet::Rebuild),
                upload_surfaces.in_set(IsoSurfaceSet::Upload),
            ),
        );
    }
}

/// Rebuilds up to [`IsoSurfaceConfig::max_surfaces_per_frame`] surfaces.
///
/// The surfaces whose last rebuild attempt is oldest go first (ties broken by
/// entity), so with more surfaces than the limit every one of them is rebuilt
/// within `ceil(total / limit)` frames. A failed rebuild is logged and the entity
/// keeps its previous mesh.
pub fn rebuild_surfaces(
    config: Res<IsoSurfaceConfig>,
    mut frame: Local<u64>,
    mut query: Query<(Entity, &mut IsoSurface)>,
) {
    *frame += 1;

    let mut due: Vec<(u64, Entity)> = query
        .iter()
        .map(|(entity, surface)| (surface.last_attempt, entity))
        .collect();
    due.sort_unstable();
    due.truncate(config.max_surfaces_per_frame);

    for (_, entity) in due {
        let Ok((_, mut surface)) = query.get_mut(entity) else {
            continue;
        };
        surface.last_attempt = *frame;
        if let Err(err) = surface.rebuild() {
            warn!("surface rebuild failed for {:?}: {}", entity, err);
        }
    }
}

/// Uploads every freshly rebuilt [`IsoSurface`] into a Bevy [`Mesh3d`].
///
/// The first upload adds a new asset; later uploads overwrite that asset in place so
/// the entity keeps the same handle.
pub fn upload_surfaces(
    mut commands: Commands,
    mut query: Query<(Entity, &mut IsoSurface, Option<&Mesh3d>)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, mut surface, mesh3d) in query.iter_mut() {
        if !surface.needs_upload {
            continue;
        }
        surface.needs_upload = false;

        let bevy_mesh = surface_to_bevy_mesh(surface.mesh());
        if let Some(existing) = mesh3d.and_then(|handle| meshes.get_mut(handle.id())) {
            *existing = bevy_mesh;
            continue;
        }
        commands.entity(entity).insert(Mesh3d(meshes.add(bevy_mesh)));
    }
}

/// Converts a [`SurfaceMesh`] into a triangle-list Bevy [`Mesh`].
pub fn surface_to_bevy_mesh(surface: &SurfaceMesh) -> Mesh {
    let mut bevy_mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );

    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.position_arrays());
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, surface.normal_arrays());
    bevy_mesh.insert_indices(Indices::U32(surface.indices.clone()));
    bevy_mesh
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        field::{Aabb, SphereField},
        types::{Point, Value},
    };

    /// Sphere that counts its updates and can be told to go bad after a number of them.
    struct CountingSphere {
        sphere: SphereField,
        updates: Arc<AtomicUsize>,
        nan_after: Option<usize>,
    }

    impl CountingSphere {
        fn new(updates: Arc<AtomicUsize>) -> Self {
            Self {
                sphere: SphereField::new(Point::origin(), 0.5),
                updates,
                nan_after: None,
            }
        }
    }

    impl ScalarField for CountingSphere {
        fn value(&self, p: &Point) -> Value {
            match self.nan_after {
                Some(limit) if self.updates.load(Ordering::SeqCst) > limit => Value::NAN,
                _ => self.sphere.value(p),
            }
        }

        fn bounds(&self) -> Aabb {
            self.sphere.bounds()
        }

        fn update(&mut self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_app(max_surfaces_per_frame: usize) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .insert_resource(IsoSurfaceConfig {
                max_surfaces_per_frame,
            })
            .add_systems(Update, (rebuild_surfaces, upload_surfaces).chain());
        app
    }

    fn total(counters: &[Arc<AtomicUsize>]) -> usize {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    #[test]
    fn bevy_mesh_carries_all_buffers() {
        let mut surface = IsoSurface::new(SphereField::new(Point::origin(), 0.5));
        let vertex_count = surface.rebuild().unwrap().vertex_count();
        assert!(vertex_count > 0);

        let bevy_mesh = surface_to_bevy_mesh(surface.mesh());
        assert_eq!(bevy_mesh.count_vertices(), vertex_count);
        assert_eq!(
            bevy_mesh.indices().map(|indices| indices.len()),
            Some(surface.mesh().indices.len())
        );
        assert!(bevy_mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let surface = IsoSurface::new(SphereField::new(Point::origin(), 0.5))
            .with_config(SurfaceConfig::default().with_step(0.0));
        assert!(surface.is_err());
    }

    #[test]
    fn rebuild_marks_for_upload() {
        let mut surface = IsoSurface::new(SphereField::new(Point::origin(), 0.5));
        assert!(!surface.needs_upload);
        surface.rebuild().unwrap();
        assert!(surface.needs_upload);
        assert!(surface.field().bounds().contains(&Point::origin()));
    }

    #[test]
    fn rebuild_window_rotates_across_frames() {
        let mut app = test_app(2);
        let counters: Vec<_> = (0..5).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let entities: Vec<_> = counters
            .iter()
            .map(|c| {
                app.world_mut()
                    .spawn(IsoSurface::new(CountingSphere::new(c.clone())))
                    .id()
            })
            .collect();

        for frame in 1..=3 {
            app.update();
            assert_eq!(total(&counters), 2 * frame);
        }
        for counter in &counters {
            assert!(counter.load(Ordering::SeqCst) >= 1);
        }
        for entity in entities {
            assert!(app.world().get::<Mesh3d>(entity).is_some());
        }

        // The first uploads moved entities to a new archetype; the rotation still
        // reaches everyone again within the next three frames.
        for _ in 0..3 {
            app.update();
        }
        for counter in &counters {
            assert!(counter.load(Ordering::SeqCst) >= 2);
        }
    }

    #[test]
    fn upload_reuses_the_mesh_asset() {
        let mut app = test_app(4);
        let entity = app
            .world_mut()
            .spawn(IsoSurface::new(SphereField::new(Point::origin(), 0.5)))
            .id();

        app.update();
        let first = app.world().get::<Mesh3d>(entity).unwrap().clone();
        app.update();
        let second = app.world().get::<Mesh3d>(entity).unwrap().clone();
        assert_eq!(first, second);

        let meshes = app.world().resource::<Assets<Mesh>>();
        assert_eq!(meshes.len(), 1);
        let surface = app.world().get::<IsoSurface>(entity).unwrap();
        assert_eq!(
            meshes.get(&second.0).map(Mesh::count_vertices),
            Some(surface.mesh().vertex_count())
        );
    }

    #[test]
    fn failed_rebuild_keeps_the_uploaded_mesh() {
        let mut app = test_app(4);
        let updates = Arc::new(AtomicUsize::new(0));
        let field = CountingSphere {
            nan_after: Some(1),
            ..CountingSphere::new(updates.clone())
        };
        let entity = app.world_mut().spawn(IsoSurface::new(field)).id();

        app.update();
        let first = app.world().get::<Mesh3d>(entity).unwrap().clone();
        let built = app.world().get::<IsoSurface>(entity).unwrap().mesh().clone();
        assert!(!built.is_empty());

        app.update();
        assert_eq!(updates.load(Ordering::SeqCst), 2);
        assert_eq!(app.world().get::<Mesh3d>(entity), Some(&first));
        let surface = app.world().get::<IsoSurface>(entity).unwrap();
        assert!(!surface.needs_upload);
        assert_eq!(surface.mesh(), &built);
    }
}
