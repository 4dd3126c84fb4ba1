//! Transfer functions and their lookup texture

mod color_function;
mod lookup;
mod piecewise;
mod property;

pub use color_function::ColorTransferFunction;
pub use lookup::{bake_lookup_table, TransferLookup, LOOKUP_SIZE};
pub use piecewise::PiecewiseFunction;
pub use property::{ColorSource, Interpolation, Shading, VolumeProperty};
