//! Defines a polarization state

/// A set of Stokes parameters, defined with respect to a pair of
/// orthogonal axes transverse to the photon direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StokesVector {
    i: f64,
    q: f64,
    u: f64,
    v: f64,
}

impl StokesVector {
    /// Creates the Stokes vector of linearly polarized radiation with
    /// intensity `along` parallel to the first axis and `across`
    /// parallel to the second.
    pub fn from_intensities(along: f64, across: f64) -> Self {
        Self {i: along + across, q: along - across, u: 0.0, v: 0.0}
    }

    /// Returns the Stokes vector if the polarization basis is rotated
    /// around the direction of propagation by an angle `theta`
    pub fn rotate_by(&self, theta: f64) -> Self {
        Self {
            i: self.i,
            q: (2.0 * theta).cos() * self.q + (2.0 * theta).sin() * self.u,
            u: -(2.0 * theta).sin() * self.q + (2.0 * theta).cos() * self.u,
            v: self.v,
        }
    }

    /// Intensity transmitted by a linear polarizer along the first axis
    pub fn parallel(&self) -> f64 {
        0.5 * (self.i + self.q)
    }

    /// Intensity transmitted by a linear polarizer along the second axis
    pub fn perpendicular(&self) -> f64 {
        0.5 * (self.i - self.q)
    }
}

impl std::ops::Mul<f64> for StokesVector {
    type Output = Self;
    fn mul(self, other: f64) -> Self {
        Self {
            i: self.i * other,
            q: self.q * other,
            u: self.u * other,
            v: self.v * other,
        }
    }
}

#[cfg(test)]
impl StokesVector {
    fn new(i: f64, q: f64, u: f64, v: f64) -> Self {
        Self{i, q, u, v}
    }

    /// Degree of polarization
    fn dop(&self) -> f64 {
        self.q.hypot(self.u).hypot(self.v) / self.i
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts;
    use super::*;

    #[test]
    fn projection_onto_rotated_axes() {
        let sv = StokesVector::from_intensities(3.0, 1.0);
        assert_eq!(sv.dop(), 0.5);

        // rotating by 90 degrees exchanges the two axes
        let rotated = sv.rotate_by(consts::FRAC_PI_2);
        println!("{:?} -> {:?}", sv, rotated);
        assert!((rotated.parallel() - 1.0).abs() < 1.0e-12);
        assert!((rotated.perpendicular() - 3.0).abs() < 1.0e-12);

        // at 45 degrees the linear polarization moves entirely into u
        let rotated = sv.rotate_by(consts::FRAC_PI_4);
        assert!((rotated.parallel() - 2.0).abs() < 1.0e-12);
        assert!((rotated.dop() - 0.5).abs() < 1.0e-12);
    }

    #[test]
    fn intensity_is_invariant() {
        let sv = StokesVector::new(1.0, 0.3, -0.2, 0.1);
        for k in 0..8 {
            let s = sv.rotate_by(0.37 * (k as f64));
            assert!((s.parallel() + s.perpendicular() - 1.0).abs() < 1.0e-14);
            assert!((s.dop() - sv.dop()).abs() < 1.0e-14);
        }
    }
}
