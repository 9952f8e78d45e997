use crate::{
    cell::CellSurface,
    error::{IsoSurfaceError, Result},
    types::{Point, Value, Vector},
};

/// Triangle soup produced by a surface build.
///
/// Vertices are never shared: triangle `t` always references vertices
/// `3t`, `3t + 1` and `3t + 2`. `normals` holds one entry per vertex, in the same
/// order, once the builder's normal pass has run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions: `[[x, y, z], ...]`
    pub vertices: Vec<Point>,

    /// Flat triangle indices into `vertices`, three per triangle.
    pub indices: Vec<u32>,

    /// Per-vertex unit normals: `[[nx, ny, nz], ...]`
    pub normals: Vec<Vector>,
}

impl SurfaceMesh {
    /// Creates an empty mesh with no vertices, triangles, or normals.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Empties all three buffers, keeping their allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.normals.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Adds a triangle defined by three vertex indices.
    ///
    /// Returns [`IsoSurfaceError::InvalidIndex`] if any index is out of bounds.
    pub fn triangle_from_verts(&mut self, a: u32, b: u32, c: u32) -> Result<()> {
        if self.vertices.len() <= a.max(b.max(c)) as usize {
            return Err(IsoSurfaceError::InvalidIndex);
        }
        self.indices.extend([a, b, c]);
        Ok(())
    }

    /// Appends a cell's triangles, each referencing its three freshly appended vertices.
    pub fn append_cell(&mut self, cell: CellSurface) -> Result<()> {
        for tri in cell.vertices.chunks_exact(3) {
            let base = self.vertices.len() as u32;
            self.vertices.extend_from_slice(tri);
            self.triangle_from_verts(base, base + 1, base + 2)?;
        }
        Ok(())
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn tri_coords(&self, tri: usize) -> [Point; 3] {
        let idx = &self.indices[3 * tri..3 * tri + 3];
        [
            self.vertices[idx[0] as usize],
            self.vertices[idx[1] as usize],
            self.vertices[idx[2] as usize],
        ]
    }

    /// Reverses the winding of every triangle.
    pub fn flip_winding(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    /// Vertex positions as plain arrays, ready for upload.
    pub fn position_arrays(&self) -> Vec<[Value; 3]> {
        self.vertices.iter().map(|p| [p.x, p.y, p.z]).collect()
    }

    /// Normals as plain arrays, ready for upload.
    pub fn normal_arrays(&self) -> Vec<[Value; 3]> {
        self.normals.iter().map(|n| [n.x, n.y, n.z]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_cell() -> CellSurface {
        CellSurface {
            vertices: vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
            ],
        }
    }

    #[test]
    fn append_cell_indexes_fresh_vertices() {
        let mut mesh = SurfaceMesh::new_empty();
        mesh.append_cell(triangle_cell()).unwrap();
        mesh.append_cell(CellSurface::default()).unwrap();
        mesh.append_cell(triangle_cell()).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        // Coinciding positions are not merged.
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.tri_coords(1), mesh.tri_coords(0));
    }

    #[test]
    fn out_of_range_triangle_is_rejected() {
        let mut mesh = SurfaceMesh::new_empty();
        mesh.append_cell(triangle_cell()).unwrap();
        assert_eq!(
            mesh.triangle_from_verts(0, 1, 3),
            Err(IsoSurfaceError::InvalidIndex)
        );
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn flip_reverses_face_orientation() {
        let mut mesh = SurfaceMesh::new_empty();
        mesh.append_cell(triangle_cell()).unwrap();
        let face_z = |mesh: &SurfaceMesh| {
            let [a, b, c] = mesh.tri_coords(0);
            (b - a).cross(&(c - b)).z
        };
        assert_relative_eq!(face_z(&mesh), 1.0);

        mesh.flip_winding();
        assert_eq!(mesh.indices, vec![0, 2, 1]);
        assert_relative_eq!(face_z(&mesh), -1.0);
        assert_eq!(mesh.tri_coords(0)[1], Point::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn clear_empties_every_buffer() {
        let mut mesh = SurfaceMesh::new_empty();
        mesh.append_cell(triangle_cell()).unwrap();
        mesh.normals.push(Vector::z());
        mesh.clear();
        assert!(mesh.is_empty());
        assert!(mesh.indices.is_empty());
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn arrays_mirror_buffers() {
        let mut mesh = SurfaceMesh::new_empty();
        mesh.append_cell(triangle_cell()).unwrap();
        mesh.normals = vec![Vector::z(); 3];
        assert_eq!(mesh.position_arrays()[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.normal_arrays(), vec![[0.0, 0.0, 1.0]; 3]);
    }
}
