//! Vectors, rotations and polarization states

mod three_vector;
pub use three_vector::*;

mod rotation;
pub use rotation::*;

mod polarization;
pub use polarization::*;
