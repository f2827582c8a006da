//! Custom implementations of special functions not
//! provided by the standard lib.

mod bessel;
mod debye;

pub use bessel::*;
pub use debye::*;

const SERIES_MAX_LENGTH: usize = 20;

/// Represents the series expansion of a function
/// in powers of its dependent variable,
/// i.e. f(x) ≈ Σ_i a[i] x^(n[i]).
struct Series<T> {
    a: [f64; SERIES_MAX_LENGTH],
    n: [T; SERIES_MAX_LENGTH],
}

impl Series<i32> {
    /// Evaluates a series expansion at `x`, including terms up to,
    /// but not including, `x^max`.
    fn evaluate_up_to(&self, x: f64, max: i32) -> f64 {
        self.n.iter()
            .take_while(|&&p| p < max)
            .zip(self.a.iter())
            .map(|(p, a)| a * x.powi(*p))
            .sum::<f64>()
    }
}
