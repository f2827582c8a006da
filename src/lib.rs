//! Coherent bremsstrahlung from oriented crystal radiators.
//!
//! [`RadiatorModel`] combines a beam, a crystal radiator and a collimator,
//! and returns photon emission rates per electron: coherent, from the sum
//! over the reciprocal lattice of the crystal, and incoherent, from
//! bremsstrahlung on individual nuclei and atomic electrons.
//!
//! ```no_run
//! use cobrems::RadiatorModel;
//!
//! let model = RadiatorModel::new(12.0, 9.0)?;
//! for i in 1..100 {
//!     let x = 0.01 * (i as f64);
//!     println!("{:.2} {:.6e}", x, model.rate_dntdx(x)?);
//! }
//! # Ok::<(), cobrems::RadiatorError>(())
//! ```

pub mod constants;
pub mod crystal;
pub mod error;
pub mod geometry;
pub mod input;
pub mod lattice;
pub mod radiator;
pub mod sampler;
pub mod scattering;

mod pwmci;
mod quadrature;
mod special_functions;

pub use crystal::{CrystalSpecies, CrystalTable};
pub use error::RadiatorError;
pub use geometry::Orientation;
pub use lattice::{LatticeSum, LatticeTerm};
pub use radiator::{Aperture, CollimatorOverride, RadiatorModel};
pub use sampler::SpectrumSampler;
pub use scattering::MultipleScattering;
