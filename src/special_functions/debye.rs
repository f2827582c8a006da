//! The first-order Debye function, which sets the thermal
//! vibration amplitude of atoms in a crystal lattice.

use std::f64::consts;
use super::Series;

/// phi(x) = 1 - x/4 + x^2/36 - x^4/3600 + ...,
/// from the Bernoulli expansion of t / (e^t - 1).
static DEBYE_SERIES: Series<i32> = Series {
    a: [
        1.0, -0.25, 1.0 / 36.0, -1.0 / 3600.0, 1.0 / 211680.0,
        -1.0 / 10886400.0, 1.0 / 526901760.0, -691.0 / 16999766784000.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    n: [
        0, 1, 2, 4, 6, 8, 10, 12,
        99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    ],
};

/// Returns the Debye function
/// ```text
///   phi(x) = (1/x) int_0^x t / (e^t - 1) dt
/// ```
/// for x > 0. phi(0) = 1 and phi(x) -> pi^2 / (6 x) as x -> infinity.
pub fn debye_phi(x: f64) -> f64 {
    if x <= 0.0 {
        1.0
    } else if x < 1.0 {
        DEBYE_SERIES.evaluate_up_to(x, 14)
    } else {
        // int_x^inf t / (e^t - 1) dt = sum_k e^{-k x} (x/k + 1/k^2)
        let tail: f64 = (1..=60)
            .map(|k| {
                let k = k as f64;
                (-k * x).exp() * (x / k + 1.0 / (k * k))
            })
            .sum();
        (consts::PI * consts::PI / 6.0 - tail) / x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrature::composite_gauss;

    #[test]
    fn matches_direct_integration() {
        for x in [0.01f64, 0.5, 0.999, 1.0, 2.0, 7.333, 30.0].iter() {
            let x = *x;
            let target = composite_gauss(|t| if t == 0.0 { 1.0 } else { t / t.exp_m1() }, 0.0, x, 8) / x;
            let value = debye_phi(x);
            let error = ((value - target) / target).abs();
            println!("phi({}) = {:.9e}, expected {:.9e}, error {:.3e}", x, value, target, error);
            assert!(error < 1.0e-9);
        }
    }

    #[test]
    fn limits() {
        assert_eq!(debye_phi(0.0), 1.0);
        let x = 200.0;
        assert!((debye_phi(x) * x * 6.0 / (consts::PI * consts::PI) - 1.0).abs() < 1.0e-12);
    }
}
