//! Orthonormal 3x3 rotations and the radiator orientation built from them

use super::ThreeVector;

/// A 3x3 rotation matrix, stored row-major.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationMatrix {
    m: [[f64; 3]; 3],
}

impl RotationMatrix {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Right-handed rotation by `theta` around the x axis.
    pub fn around_x(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
        }
    }

    /// Right-handed rotation by `theta` around the y axis.
    pub fn around_y(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            m: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        }
    }

    /// Right-handed rotation by `theta` around the z axis.
    pub fn around_z(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self {
            m: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Returns `Rx(thetax) Ry(thetay) Rz(thetaz)`: a roll around z,
    /// followed by a rotation around y and then around x, all
    /// about the fixed beam axes.
    pub fn from_angles(thetax: f64, thetay: f64, thetaz: f64) -> Self {
        Self::around_x(thetax) * Self::around_y(thetay) * Self::around_z(thetaz)
    }

    /// Inverse of [`from_angles`](Self::from_angles), valid for
    /// |thetay| < pi/2.
    pub fn angles(&self) -> (f64, f64, f64) {
        let m = &self.m;
        let thetay = m[0][2].clamp(-1.0, 1.0).asin();
        let thetax = (-m[1][2]).atan2(m[2][2]);
        let thetaz = (-m[0][1]).atan2(m[0][0]);
        (thetax, thetay, thetaz)
    }

    pub fn transpose(&self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = self.m[j][i];
            }
        }
        Self { m: out }
    }

    pub fn element(&self, i: usize, j: usize) -> f64 {
        self.m[i][j]
    }

    /// Largest deviation of `R^T R` from the identity.
    pub fn orthonormality_error(&self) -> f64 {
        let p = self.transpose() * *self;
        let mut err: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                let target = if i == j { 1.0 } else { 0.0 };
                err = err.max((p.m[i][j] - target).abs());
            }
        }
        err
    }
}

impl std::ops::Mul for RotationMatrix {
    type Output = RotationMatrix;
    fn mul(self, other: RotationMatrix) -> RotationMatrix {
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = (0..3).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        RotationMatrix { m: out }
    }
}

impl std::ops::Mul<ThreeVector> for RotationMatrix {
    type Output = ThreeVector;
    fn mul(self, v: ThreeVector) -> ThreeVector {
        let row = |i: usize| self.m[i][0] * v[0] + self.m[i][1] * v[1] + self.m[i][2] * v[2];
        ThreeVector::new(row(0), row(1), row(2))
    }
}

/// Orientation of the radiator with respect to the beam: the three
/// stored angles and the rotation that takes crystal axes into the
/// beam frame. The matrix is always rebuilt from, or decomposed into,
/// the angles, so the two never disagree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    thetax: f64,
    thetay: f64,
    thetaz: f64,
    rmatrix: RotationMatrix,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Orientation {
    pub fn identity() -> Self {
        Self {
            thetax: 0.0,
            thetay: 0.0,
            thetaz: 0.0,
            rmatrix: RotationMatrix::identity(),
        }
    }

    pub fn from_angles(thetax: f64, thetay: f64, thetaz: f64) -> Self {
        Self {
            thetax,
            thetay,
            thetaz,
            rmatrix: RotationMatrix::from_angles(thetax, thetay, thetaz),
        }
    }

    /// Composes an incremental rotation `Rx(dx) Ry(dy) Rz(dz)` with
    /// the current orientation. The increment acts in the crystal frame,
    /// i.e. it is applied before the existing rotation.
    pub fn rotated_by(&self, dx: f64, dy: f64, dz: f64) -> Self {
        let rmatrix = self.rmatrix * RotationMatrix::from_angles(dx, dy, dz);
        let (thetax, thetay, thetaz) = rmatrix.angles();
        Self { thetax, thetay, thetaz, rmatrix }
    }

    pub fn with_thetax(&self, thetax: f64) -> Self {
        Self::from_angles(thetax, self.thetay, self.thetaz)
    }

    pub fn with_thetay(&self, thetay: f64) -> Self {
        Self::from_angles(self.thetax, thetay, self.thetaz)
    }

    pub fn with_thetaz(&self, thetaz: f64) -> Self {
        Self::from_angles(self.thetax, self.thetay, thetaz)
    }

    pub fn thetax(&self) -> f64 {
        self.thetax
    }

    pub fn thetay(&self) -> f64 {
        self.thetay
    }

    pub fn thetaz(&self) -> f64 {
        self.thetaz
    }

    pub fn matrix(&self) -> &RotationMatrix {
        &self.rmatrix
    }

    /// Maps a crystal-frame vector into the beam frame.
    pub fn to_beam_frame(&self, v: ThreeVector) -> ThreeVector {
        self.rmatrix * v
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts;
    use super::*;

    #[test]
    fn angles_round_trip() {
        let (a, b, c) = (0.031, -0.7, 1.2);
        let r = RotationMatrix::from_angles(a, b, c);
        let (x, y, z) = r.angles();
        println!("in = ({}, {}, {}), out = ({}, {}, {})", a, b, c, x, y, z);
        assert!((x - a).abs() < 1.0e-12 && (y - b).abs() < 1.0e-12 && (z - c).abs() < 1.0e-12);
        assert!(r.orthonormality_error() < 1.0e-14);
    }

    #[test]
    fn incremental_rotations_compose() {
        let (a, b) = (3.0e-3, 0.05);
        let stepwise = Orientation::identity()
            .rotated_by(a, 0.0, 0.0)
            .rotated_by(0.0, b, 0.0);
        let direct = Orientation::from_angles(a, b, 0.0);
        for i in 0..3 {
            for j in 0..3 {
                let d = stepwise.matrix().element(i, j) - direct.matrix().element(i, j);
                assert!(d.abs() < 1.0e-14);
            }
        }
        assert!((stepwise.thetax() - a).abs() < 1.0e-14);
        assert!((stepwise.thetay() - b).abs() < 1.0e-14);
        assert!(stepwise.thetaz().abs() < 1.0e-14);
    }

    #[test]
    fn roll_is_about_beam_axis() {
        // with no tilts, a roll leaves longitudinal components alone
        let o = Orientation::from_angles(0.0, 0.0, consts::FRAC_PI_4);
        let v = o.to_beam_frame(ThreeVector::new(1.0, 1.0, 0.0));
        println!("v = {}", v);
        assert!(v[2].abs() < 1.0e-15);
        assert!(v[0].abs() < 1.0e-15);
        assert!((v[1] - 2.0f64.sqrt()).abs() < 1.0e-15);
    }

    #[test]
    fn long_sequences_stay_orthonormal() {
        let mut o = Orientation::identity();
        for i in 0..1000 {
            let t = 1.0e-3 * (i as f64);
            o = o.rotated_by(t.sin() * 1.0e-2, t.cos() * 2.0e-2, 1.0e-3);
        }
        println!("error = {:e}", o.matrix().orthonormality_error());
        assert!(o.matrix().orthonormality_error() < 1.0e-12);
    }
}
