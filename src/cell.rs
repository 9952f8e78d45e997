use crate::{
    builder::SurfaceConfig,
    error::{IsoSurfaceError, Result},
    field::ScalarField,
    interp::edge_crossing,
    tables::{CORNER_OFFSETS, CUBE_EDGES, triangle_count, triangle_edges},
    types::{Point, Value, Vector},
};

/// Triangles produced by a single lattice cell.
///
/// Vertices are stored flat; every group of three consecutive vertices forms one
/// triangle, in the winding order of the case table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellSurface {
    pub vertices: Vec<Point>,
}

impl CellSurface {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Returns the 8 world-space corner positions of the cell at `origin` with edge length `size`.
///
/// Corners are ordered to match [`CORNER_OFFSETS`].
#[inline]
pub fn corner_positions(origin: &Point, size: Value) -> [Point; 8] {
    CORNER_OFFSETS.map(|[dx, dy, dz]| {
        origin + Vector::new(dx as Value, dy as Value, dz as Value) * size
    })
}

/// Computes the case index for a cell.
///
/// Each of the 8 corners maps to one bit. A bit is set when the corner's value
/// is **strictly above** zero; a value of exactly zero counts as outside.
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// mask bits:    [_][_][_][_][_][_][_][_]
///                                     ^-- corner 0 inside?
/// ```
#[inline]
pub fn corner_mask(values: &[Value; 8]) -> u8 {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0.0)
        .fold(0u8, |mask, (i, _)| mask | (1 << i))
}

/// Samples `field` at `p`, rejecting NaN and infinity.
#[inline]
pub(crate) fn sample<F: ScalarField + ?Sized>(field: &F, p: &Point) -> Result<Value> {
    let v = field.value(p);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(IsoSurfaceError::NonFiniteSample {
            x: p.x,
            y: p.y,
            z: p.z,
        })
    }
}

/// Tessellates one lattice cell.
///
/// ```text
/// 1. corner_positions   →  8 world-space points
/// 2. field.value (×8)   →  8 scalar values
/// 3. corner_mask        →  256-entry case index
/// 4. triangle_edges     →  3 crossed edges per triangle
/// 5. edge_crossing      →  one interpolated vertex per edge
/// ```
///
/// Cells never share vertices: a crossing shared with a neighbouring cell is
/// computed again there.
pub fn tessellate_cell<F: ScalarField + ?Sized>(
    field: &F,
    origin: &Point,
    size: Value,
    config: &SurfaceConfig,
) -> Result<CellSurface> {
    let corners = corner_positions(origin, size);

    let mut values = [0.0; 8];
    for (value, corner) in values.iter_mut().zip(corners.iter()) {
        *value = sample(field, corner)?;
    }

    let mask = corner_mask(&values);
    let count = triangle_count(mask);
    if count == 0 {
        return Ok(CellSurface::default());
    }

    let mut vertices = Vec::with_capacity(3 * count);
    for tri in 0..count {
        for edge in triangle_edges(mask, tri) {
            let [ia, ib] = CUBE_EDGES[edge];
            vertices.push(edge_crossing(
                &corners[ia],
                &corners[ib],
                values[ia],
                values[ib],
                config.interpolation_epsilon,
            ));
        }
    }

    Ok(CellSurface { vertices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Aabb, FunctionField, SphereField};
    use approx::assert_relative_eq;

    fn plane_x(offset: Value) -> FunctionField {
        // Positive for x < offset.
        FunctionField::new(Aabb::around(Point::origin(), 1.0), move |p: Point| {
            offset - p.x
        })
    }

    #[test]
    fn corners_follow_offset_table() {
        let corners = corner_positions(&Point::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(corners[0], Point::new(1.0, 2.0, 3.0));
        assert_eq!(corners[2], Point::new(1.5, 2.5, 3.0));
        assert_eq!(corners[4], Point::new(1.0, 2.0, 3.5));
        assert_eq!(corners[6], Point::new(1.5, 2.5, 3.5));
    }

    #[test]
    fn mask_treats_zero_as_outside() {
        assert_eq!(corner_mask(&[0.0; 8]), 0);
        assert_eq!(corner_mask(&[1.0; 8]), 255);
        assert_eq!(
            corner_mask(&[1.0, 0.0, -1.0, 0.5, 0.0, 0.0, 0.0, 2.0]),
            0b1000_1001
        );
    }

    #[test]
    fn uniform_cells_emit_nothing() {
        let config = SurfaceConfig::default();
        let inside = tessellate_cell(&plane_x(10.0), &Point::origin(), 1.0, &config).unwrap();
        let outside = tessellate_cell(&plane_x(-10.0), &Point::origin(), 1.0, &config).unwrap();
        assert!(inside.is_empty());
        assert!(outside.is_empty());
    }

    #[test]
    fn plane_through_cell_lands_on_plane() {
        let config = SurfaceConfig::default();
        let cell = tessellate_cell(&plane_x(0.25), &Point::origin(), 1.0, &config).unwrap();

        // Corners 0, 3, 4, 7 are inside: a quad split into two triangles.
        assert_eq!(cell.triangle_count(), 2);
        assert_eq!(cell.vertices.len(), 6);
        for v in &cell.vertices {
            assert_relative_eq!(v.x, 0.25, epsilon = 1e-6);
            assert!((0.0..=1.0).contains(&v.y));
            assert!((0.0..=1.0).contains(&v.z));
        }
    }

    #[test]
    fn triangles_face_into_the_positive_side() {
        let config = SurfaceConfig::default();
        let cell = tessellate_cell(&plane_x(0.5), &Point::origin(), 1.0, &config).unwrap();
        for tri in cell.vertices.chunks(3) {
            let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[1]));
            // Inside is x < 0.5.
            assert!(n.x < 0.0, "{n:?}");
        }
    }

    #[test]
    fn corner_inside_sphere_cuts_a_single_triangle() {
        let config = SurfaceConfig::default();
        let sphere = SphereField::new(Point::origin(), 0.5);
        let cell = tessellate_cell(&sphere, &Point::origin(), 1.0, &config).unwrap();

        assert_eq!(cell.triangle_count(), 1);
        // 0.25 - x^2 interpolated linearly from 0.25 to -0.75 crosses at 0.25.
        for v in &cell.vertices {
            assert_relative_eq!(v.coords.norm(), 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn non_finite_sample_fails_the_cell() {
        let config = SurfaceConfig::default();
        let field = FunctionField::new(Aabb::around(Point::origin(), 1.0), |p: Point| {
            if p.z > 0.5 { Value::NAN } else { 1.0 }
        });
        let err = tessellate_cell(&field, &Point::origin(), 1.0, &config).unwrap_err();
        assert!(matches!(err, IsoSurfaceError::NonFiniteSample { z, .. } if z == 1.0));
    }
}
