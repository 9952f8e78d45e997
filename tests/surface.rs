use approx::assert_relative_eq;
use bevy_isosurface::{
    Aabb, FunctionField, MetaBall, MetaBallField, ScalarField, SphereField, SurfaceBuilder,
    SurfaceConfig,
    mesh::SurfaceMesh,
    types::{Point, Value, Vector},
};

const R: Value = 1.0;
const STEP: Value = 0.1;

fn unit_sphere_mesh(config: SurfaceConfig) -> SurfaceMesh {
    let mut sphere = SphereField::new(Point::origin(), R);
    SurfaceBuilder::new(config)
        .unwrap()
        .build(&mut sphere)
        .unwrap()
}

fn assert_well_formed(mesh: &SurfaceMesh) {
    assert_eq!(mesh.indices.len() % 3, 0);
    assert_eq!(mesh.normals.len(), mesh.vertices.len());
    let count = mesh.vertex_count() as u32;
    for tri in mesh.indices.chunks(3) {
        assert!(tri.iter().all(|&i| i < count), "{tri:?}");
        assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
    }
}

#[test]
fn sphere_surface_stays_within_one_step() {
    let mesh = unit_sphere_mesh(SurfaceConfig::default().with_step(STEP));

    assert!(mesh.vertex_count() > 0);
    assert_well_formed(&mesh);
    for v in &mesh.vertices {
        let r = v.coords.norm();
        assert!(r >= R - STEP && r <= R + STEP, "{v:?} at radius {r}");
    }
}

#[test]
fn sphere_normals_are_unit_and_outward() {
    let mesh = unit_sphere_mesh(SurfaceConfig::default());

    for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-4);
        // F decreases away from the centre, so normals point outward.
        assert!(n.dot(&v.coords.normalize()) > 0.9, "{v:?} -> {n:?}");
    }
}

#[test]
fn table_winding_faces_the_positive_side() {
    let plain = unit_sphere_mesh(SurfaceConfig::default());
    let flipped = unit_sphere_mesh(SurfaceConfig::default().with_flip_winding(true));

    let facing = |mesh: &SurfaceMesh| {
        let mut inward = 0;
        let mut outward = 0;
        for tri in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.tri_coords(tri);
            // Slivers around lattice corners lying on the sphere carry no reliable direction.
            let n = (b - a).cross(&(c - b));
            if n.norm() < 1e-5 {
                continue;
            }
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            if n.dot(&centroid) < 0.0 {
                inward += 1;
            } else {
                outward += 1;
            }
        }
        (inward, outward)
    };

    let (inward, outward) = facing(&plain);
    assert!(inward > 0 && outward * 100 <= inward, "{inward} in, {outward} out");

    let (inward, outward) = facing(&flipped);
    assert!(outward > 0 && inward * 100 <= outward, "{inward} in, {outward} out");
}

#[test]
fn rebuilding_a_static_field_is_idempotent() {
    let mut sphere = SphereField::new(Point::new(0.1, -0.2, 0.05), 0.7);
    let mut builder = SurfaceBuilder::new(SurfaceConfig::default()).unwrap();

    let first = builder.rebuild(&mut sphere).unwrap().clone();
    let second = builder.rebuild(&mut sphere).unwrap();
    assert_eq!(&first, second);
}

#[test]
fn empty_bounds_build_an_empty_mesh() {
    let mut field = FunctionField::new(
        Aabb::new(Point::new(1.0, 1.0, 1.0), Point::new(-1.0, 2.0, 2.0)),
        |p: Point| 1.0 - p.coords.norm_squared(),
    );
    let mesh = SurfaceBuilder::new(SurfaceConfig::default())
        .unwrap()
        .build(&mut field)
        .unwrap();
    assert!(mesh.is_empty());
    assert!(mesh.indices.is_empty());
    assert!(mesh.normals.is_empty());
}

#[test]
fn surface_reaching_the_bounds_is_not_clipped() {
    // A plane crossing the whole box: the padding makes the scan reach past every face.
    let mut field = FunctionField::new(Aabb::around(Point::origin(), 0.5), |p: Point| {
        0.05 - p.y
    });
    let mesh = SurfaceBuilder::new(SurfaceConfig::default())
        .unwrap()
        .build(&mut field)
        .unwrap();

    assert_well_formed(&mesh);
    let max_x = mesh.vertices.iter().map(|v| v.x).fold(Value::MIN, Value::max);
    let min_x = mesh.vertices.iter().map(|v| v.x).fold(Value::MAX, Value::min);
    assert!(max_x >= 0.5 && min_x <= -0.5, "{min_x}..{max_x}");
    for v in &mesh.vertices {
        assert_relative_eq!(v.y, 0.05, epsilon = 1e-5);
    }
}

#[test]
fn animated_metaballs_rebuild_every_call() {
    let mut field = MetaBallField::new(vec![
        MetaBall::new(Point::new(-0.4, 0.0, 0.0), 0.4).with_motion(Vector::x(), 2.0, 0.0),
        MetaBall::new(Point::new(0.4, 0.0, 0.0), 0.4),
    ])
    .with_time_step(0.25);
    let mut builder = SurfaceBuilder::new(SurfaceConfig::default()).unwrap();

    let first = builder.rebuild(&mut field).unwrap().clone();
    let second = builder.rebuild(&mut field).unwrap().clone();

    assert_relative_eq!(field.time(), 0.5);
    assert_well_formed(&first);
    assert_well_formed(&second);
    assert!(first.vertex_count() > 0);
    assert_ne!(first.vertices, second.vertices);

    for v in &second.vertices {
        assert!(field.bounds().padded(STEP).contains(v), "{v:?}");
    }
}
