use derive_more::Display;

pub type Result<T> = core::result::Result<T, IsoSurfaceError>;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum IsoSurfaceError {
    /// Lattice step is zero, negative or not finite.
    #[display("lattice step must be finite and positive")]
    InvalidStep,
    /// Normal or interpolation epsilon is zero, negative or not finite.
    #[display("epsilon must be finite and positive")]
    InvalidEpsilon,
    /// The field returned NaN or infinity at the given position.
    #[display("field returned a non-finite value at ({x}, {y}, {z})")]
    NonFiniteSample { x: f32, y: f32, z: f32 },
    /// A triangle index points past the end of the vertex buffer.
    #[display("triangle references a vertex that does not exist")]
    InvalidIndex,
}

impl std::error::Error for IsoSurfaceError {}
