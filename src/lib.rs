pub mod builder;
pub mod cell;
pub mod error;
pub mod field;
pub mod interp;
pub mod mesh;
pub mod metaball;
pub mod plugin;
pub mod tables;
pub mod types;

pub use builder::{SurfaceBuilder, SurfaceConfig};
pub use field::{Aabb, FunctionField, ScalarField, SphereField};
pub use metaball::{MetaBall, MetaBallField};
pub use plugin::{IsoSurface, IsoSurfacePlugin};
