use tracing::{debug, trace};

use crate::{
    cell::{sample, tessellate_cell},
    error::{IsoSurfaceError, Result},
    field::ScalarField,
    mesh::SurfaceMesh,
    types::{Point, Value, Vector},
};

/// Tessellation settings shared by every build of a [`SurfaceBuilder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    /// Edge length of each lattice cell. Default: `0.1`.
    pub step: Value,
    /// Offset used for the central differences of the normal pass. Should be much
    /// smaller than `step`. Default: `1e-4`.
    pub normal_epsilon: Value,
    /// Below this value difference an edge crossing falls back to the edge midpoint.
    /// Default: `1e-6`.
    pub interpolation_epsilon: Value,
    /// Reverse every triangle after tessellation.
    ///
    /// Case-table triangles wind counter-clockwise around a face normal pointing
    /// into the positive region, while vertex normals point out of it. Renderers
    /// treating counter-clockwise faces as front faces want this enabled.
    pub flip_winding: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            normal_epsilon: 1e-4,
            interpolation_epsilon: 1e-6,
            flip_winding: false,
        }
    }
}

impl SurfaceConfig {
    /// Sets the lattice step.
    pub fn with_step(mut self, step: Value) -> Self {
        self.step = step;
        self
    }

    /// Sets the central-difference offset of the normal pass.
    pub fn with_normal_epsilon(mut self, epsilon: Value) -> Self {
        self.normal_epsilon = epsilon;
        self
    }

    /// Sets the edge interpolation fallback threshold.
    pub fn with_interpolation_epsilon(mut self, epsilon: Value) -> Self {
        self.interpolation_epsilon = epsilon;
        self
    }

    /// Enables or disables winding reversal.
    pub fn with_flip_winding(mut self, flip: bool) -> Self {
        self.flip_winding = flip;
        self
    }

    /// Checks that the step and both epsilons are finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(IsoSurfaceError::InvalidStep);
        }
        let positive = |e: Value| e.is_finite() && e > 0.0;
        if !positive(self.normal_epsilon) || !positive(self.interpolation_epsilon) {
            return Err(IsoSurfaceError::InvalidEpsilon);
        }
        Ok(())
    }
}

/// Number of cells along one axis of the padded scan.
///
/// Cell origins are `min - step + i * step` for every `i` whose origin is still
/// below `max + step`. Returns `0` when `max <= min`.
pub fn cell_count(min: Value, max: Value, step: Value) -> usize {
    if !(max > min) || !(step > 0.0) {
        return 0;
    }
    // Computed in f64 with a small slack so an origin landing on `max + step` up
    // to rounding is not counted.
    let span = (max as f64 - min as f64) + 2.0 * step as f64;
    let cells = (span / step as f64 - 1e-6).ceil();
    if cells.is_finite() && cells > 0.0 {
        cells as usize
    } else {
        0
    }
}

/// Computes the unit normal at `p` from central differences of `field`.
///
/// The gradient is negated, so the normal points toward decreasing field values.
/// Where the gradient vanishes the normal falls back to `+Y`.
pub fn compute_normal<F: ScalarField + ?Sized>(field: &F, p: &Point, eps: Value) -> Result<Vector> {
    let mut gradient = Vector::zeros();
    for axis in 0..3 {
        let mut offset = Vector::zeros();
        offset[axis] = eps;
        gradient[axis] = sample(field, &(p + offset))? - sample(field, &(p - offset))?;
    }

    Ok((-gradient).try_normalize(0.0).unwrap_or_else(Vector::y))
}

/// Rebuilds a [`SurfaceMesh`] from a [`ScalarField`] on demand.
///
/// Every build starts from scratch:
///
/// ```text
/// field.update()                     once, before any sampling
///   → scan padded bounding box       x, then y, then z
///     → tessellate_cell (per cell)   append to scratch mesh
///   → compute_normal (per vertex)    only after every vertex exists
///   → swap scratch into place        only if nothing failed
/// ```
#[derive(Debug, Clone, Default)]
pub struct SurfaceBuilder {
    config: SurfaceConfig,
    mesh: SurfaceMesh,
    scratch: SurfaceMesh,
}

impl SurfaceBuilder {
    /// Creates a builder, rejecting invalid settings.
    pub fn new(config: SurfaceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// The mesh of the last successful build. Empty before the first one.
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// Advances `field` once and retessellates it.
    ///
    /// On success the new mesh replaces the previous one. On failure the previous
    /// mesh is left untouched and the error is returned.
    pub fn rebuild<F: ScalarField + ?Sized>(&mut self, field: &mut F) -> Result<&SurfaceMesh> {
        field.update();

        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();

        match fill_mesh(&*field, &self.config, &mut scratch) {
            Ok(()) => {
                std::mem::swap(&mut self.mesh, &mut scratch);
                self.scratch = scratch;
                Ok(&self.mesh)
            }
            Err(err) => {
                self.scratch = scratch;
                Err(err)
            }
        }
    }

    /// Like [`rebuild`](SurfaceBuilder::rebuild), but hands the mesh over instead
    /// of keeping it.
    pub fn build<F: ScalarField + ?Sized>(&mut self, field: &mut F) -> Result<SurfaceMesh> {
        self.rebuild(field)?;
        Ok(std::mem::take(&mut self.mesh))
    }
}

/// Scans the padded bounding box of `field` into `mesh` and fills in normals.
fn fill_mesh<F: ScalarField + ?Sized>(
    field: &F,
    config: &SurfaceConfig,
    mesh: &mut SurfaceMesh,
) -> Result<()> {
    let step = config.step;
    let bounds = field.bounds();

    let (nx, ny, nz) = if bounds.is_empty() {
        (0, 0, 0)
    } else {
        (
            cell_count(bounds.min_x(), bounds.max_x(), step),
            cell_count(bounds.min_y(), bounds.max_y(), step),
            cell_count(bounds.min_z(), bounds.max_z(), step),
        )
    };
    debug!(
        "scanning {}x{}x{} cells of size {} over {:?}",
        nx, ny, nz, step, bounds
    );

    let start = bounds.min - Vector::repeat(step);
    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                let origin = Point::new(
                    start.x + x as Value * step,
                    start.y + y as Value * step,
                    start.z + z as Value * step,
                );
                let cell = tessellate_cell(field, &origin, step, config)?;
                if !cell.is_empty() {
                    trace!("cell {:?}: {} triangles", origin, cell.triangle_count());
                    mesh.append_cell(cell)?;
                }
            }
        }
    }

    if config.flip_winding {
        mesh.flip_winding();
    }

    mesh.normals.reserve(mesh.vertices.len());
    for vertex in &mesh.vertices {
        mesh.normals.push(compute_normal(field, vertex, config.normal_epsilon)?);
    }

    debug!(
        "built surface: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(())
}
