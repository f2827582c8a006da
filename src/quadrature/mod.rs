//! Numerical integration

mod gauss;
pub use gauss::*;

mod adaptive;
pub use adaptive::*;
