//! Evaluates the exponentially scaled modified Bessel function,
//! I0e(x) = exp(-x) I_0(x), for real x >= 0.

use std::f64::consts;
use crate::quadrature::{gauss_16, gauss_32};

pub trait BesselI {
    /// Evaluates `exp(-x) I_0(x)`, which is finite for all x >= 0
    fn i0e(&self) -> Self;
}

impl BesselI for f64 {
    fn i0e(&self) -> Self {
        i0e(self.abs())
    }
}

fn i0e(x: f64) -> f64 {
    if x < 0.1 {
        // Fractional error < 1.0e-9
        (1.0 + x * x / 4.0 + x * x * x * x / 64.0) * (-x).exp()
    } else if x < 5.0 {
        // I0e(x) = (1/pi) int_0^pi exp[x (cos t - 1)] dt
        gauss_16(|t| (x * (t.cos() - 1.0)).exp(), 0.0, consts::PI) / consts::PI
    } else if x < 20.0 {
        // Gauss quadrature, 32 nodes
        gauss_32(|t| (x * (t.cos() - 1.0)).exp(), 0.0, consts::PI) / consts::PI
    } else {
        // Asymptotic expansion
        let prefactor = 1.0 / (2.0 * consts::PI * x).sqrt();
        prefactor * (
            1.0 + 1.0 / (8.0 * x) + 9.0 / (128.0 * x * x) + 75.0 / (1024.0 * x * x * x)
            + 3675.0 / (32768.0 * x * x * x * x)
        )
    }
}
