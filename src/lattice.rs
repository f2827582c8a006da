//! The reciprocal lattice of a crystal radiator, and the sums over it
//! that give the coherent bremsstrahlung rate.

use crate::crystal::CrystalSpecies;
use crate::error::RadiatorError;
use crate::geometry::{Orientation, ThreeVector};

/// Reciprocal vectors are included up to this shell, max(|h|,|k|,|l|).
pub const MAX_SHELL: usize = 30;

/// Each of the two outermost shells may contribute at most this
/// fraction of the total for the sum to be accepted.
pub const SHELL_TOLERANCE: f64 = 1.0e-3;

/// Relative structure factor below which a reflection is forbidden.
const FORBIDDEN: f64 = 1.0e-6;

/// A reciprocal lattice vector in the crystal frame, in units of the
/// electron mass, and the part of its scattering strength that is
/// independent of the photon kinematics: |S|^2 DW(g) FF(g).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeVector {
    pub hkl: [i32; 3],
    pub shell: usize,
    pub g: ThreeVector,
    pub strength: f64,
}

/// One term of a coherent lattice sum, as it was actually included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeTerm {
    pub hkl: [i32; 3],
    /// Squared momentum transfer, units of the electron mass squared
    pub q2: f64,
    /// Squared emission angle of the coherent photon, rad^2
    pub theta2: f64,
    /// Azimuth of the transverse momentum transfer, rad
    pub phi: f64,
    /// Contribution to the unpolarized sum
    pub weight: f64,
    /// Linearly polarized part of the contribution, along the azimuth `phi`
    pub polarized: f64,
}

/// Result of a coherent lattice sum: the unpolarized and polarized
/// coherent rates dN/dx, and the individual terms that make them up.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LatticeSum {
    pub unpolarized: f64,
    pub polarized: f64,
    pub terms: Vec<LatticeTerm>,
}

impl LatticeSum {
    /// Total contribution of the given shell.
    pub fn shell_contribution(&self, shell: usize) -> f64 {
        self.terms.iter()
            .filter(|t| shell_of(t.hkl) == shell)
            .map(|t| t.weight)
            .sum()
    }

    /// Returns the sum if each of the two outermost shells contributes at
    /// most `tolerance` of the unpolarized total, or a convergence error
    /// carrying the partial sum otherwise.
    pub fn converged(self, max_shell: usize, tolerance: f64) -> Result<Self, RadiatorError> {
        let total = self.unpolarized.abs();
        for shell in max_shell.saturating_sub(1)..=max_shell {
            let part = self.shell_contribution(shell).abs();
            if part > tolerance * total {
                return Err(RadiatorError::convergence(
                    &format!("lattice sum, shell {} contributes {:.3e} of the total", shell, part / total),
                    self.unpolarized,
                ));
            }
        }
        Ok(self)
    }
}

fn shell_of(hkl: [i32; 3]) -> usize {
    hkl.iter().map(|i| i.unsigned_abs() as usize).max().unwrap_or(0)
}

/// The allowed reflections of a crystal, sorted by shell.
#[derive(Clone, Debug, PartialEq)]
pub struct ReciprocalLattice {
    vectors: Vec<LatticeVector>,
    max_shell: usize,
    /// (2/pi) (2 pi / a)^3 / nsites: converts a sum over lattice
    /// vectors into an integral over momentum transfer.
    cell_norm: f64,
    primary: ThreeVector,
}

impl ReciprocalLattice {
    pub fn build(species: &CrystalSpecies) -> Self {
        Self::with_max_shell(species, MAX_SHELL)
    }

    pub fn with_max_shell(species: &CrystalSpecies, max_shell: usize) -> Self {
        let q0 = species.reciprocal_spacing();
        let nsites = species.nsites() as f64;
        let beta2 = species.form_factor_beta.powi(2);
        let dw = species.debye_waller_constant_me();
        let n = max_shell as i32;

        let mut vectors = Vec::new();
        for h in -n..=n {
            for k in -n..=n {
                for l in -n..=n {
                    let hkl = [h, k, l];
                    if hkl == [0, 0, 0] {
                        continue;
                    }

                    let s2 = species.structure_factor(hkl).norm_sqr();
                    if s2 < FORBIDDEN * nsites * nsites {
                        continue;
                    }

                    let g = q0 * ThreeVector::new(h as f64, k as f64, l as f64);
                    let g2 = g.norm_sqr();
                    let form_factor = beta2 * beta2 / (1.0 + beta2 * g2).powi(2);
                    let strength = s2 * (-dw * g2).exp() * form_factor;

                    vectors.push(LatticeVector { hkl, shell: shell_of(hkl), g, strength });
                }
            }
        }

        vectors.sort_by_key(|v| v.shell);

        let [h, k, l] = species.primary_hkl;
        let primary = q0 * ThreeVector::new(h as f64, k as f64, l as f64);

        Self {
            vectors,
            max_shell,
            cell_norm: (2.0 / std::f64::consts::PI) * q0.powi(3) / nsites,
            primary,
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn max_shell(&self) -> usize {
        self.max_shell
    }

    pub fn cell_norm(&self) -> f64 {
        self.cell_norm
    }

    /// The primary reciprocal vector, crystal frame, units of the electron mass.
    pub fn primary(&self) -> ThreeVector {
        self.primary
    }

    /// Rotates every vector into the beam frame, keeping those with a
    /// positive longitudinal component (only those can radiate).
    pub fn rotated<'a>(&'a self, orientation: &'a Orientation) -> impl Iterator<Item = LatticeVector> + 'a {
        self.vectors.iter()
            .map(move |v| LatticeVector { g: orientation.to_beam_frame(v.g), ..*v })
            .filter(|v| v.g[2] > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diamond_lattice() {
        let diamond = CrystalSpecies::diamond();
        let lattice = ReciprocalLattice::with_max_shell(&diamond, 4);
        println!("{} allowed reflections up to shell 4", lattice.len());

        // sorted by shell, first shell holds the eight (111)-type vectors
        let first: Vec<_> = lattice.vectors.iter().take_while(|v| v.shell == 1).collect();
        assert_eq!(first.len(), 8);
        assert!(lattice.vectors.windows(2).all(|w| w[0].shell <= w[1].shell));

        // primary vector is (220)
        let q0 = diamond.reciprocal_spacing();
        assert!((lattice.primary().norm_sqr() - 8.0 * q0 * q0).abs() < 1.0e-15);

        // half the lattice points forward of the beam, none exactly transverse
        let orientation = Orientation::from_angles(0.01, 0.02, 0.03);
        let forward = lattice.rotated(&orientation).count();
        assert_eq!(2 * forward, lattice.len());
    }

    #[test]
    fn shell_bookkeeping() {
        let sum = LatticeSum {
            unpolarized: 1.0,
            polarized: 0.0,
            terms: vec![
                LatticeTerm { hkl: [2, 2, 0], q2: 0.0, theta2: 0.0, phi: 0.0, weight: 0.9995, polarized: 0.0 },
                LatticeTerm { hkl: [4, 4, 4], q2: 0.0, theta2: 0.0, phi: 0.0, weight: 0.0005, polarized: 0.0 },
            ],
        };
        assert_eq!(sum.shell_contribution(4), 0.0005);
        assert!(sum.clone().converged(4, SHELL_TOLERANCE).is_ok());
        assert!(sum.clone().converged(5, SHELL_TOLERANCE).is_ok());
        assert!(sum.clone().converged(4, 1.0e-4).is_err());
        let err = sum.converged(3, SHELL_TOLERANCE).unwrap_err();
        assert_eq!(err.estimate(), Some(1.0));

        // an empty sum is exact
        assert!(LatticeSum::default().converged(30, SHELL_TOLERANCE).is_ok());
    }
}
