//! Orientation of the radiator, and the solution for the angle that
//! places the primary coherent edge at a requested photon energy.

use crate::constants::*;
use crate::error::RadiatorError;
use crate::geometry::{Orientation, RotationMatrix, ThreeVector};
use super::RadiatorModel;

/// Largest fractional mismatch between the requested and achieved edge.
const EDGE_TOLERANCE: f64 = 1.0e-9;

/// Tilt (rad) about the vertical axis applied by
/// [`align_target`](RadiatorModel::align_target): it moves the other
/// members of the primary vector's row away from the edge.
pub const STANDARD_TILT: f64 = 0.02;

/// Wraps an angle into (-pi, pi].
fn wrap(theta: f64) -> f64 {
    use std::f64::consts::PI;
    let t = theta.rem_euclid(2.0 * PI);
    if t > PI { t - 2.0 * PI } else { t }
}

impl RadiatorModel {
    pub fn target_orientation(&self) -> &Orientation {
        &self.orientation
    }

    pub fn target_thetax(&self) -> f64 {
        self.orientation.thetax()
    }

    pub fn target_thetay(&self) -> f64 {
        self.orientation.thetay()
    }

    pub fn target_thetaz(&self) -> f64 {
        self.orientation.thetaz()
    }

    pub fn set_target_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Applies the incremental rotation `Rx(dx) Ry(dy) Rz(dz)` (rad) in the
    /// crystal frame, i.e. before the existing rotation, and updates the
    /// stored angles to match.
    pub fn rotate_target(&mut self, dx: f64, dy: f64, dz: f64) {
        self.orientation = self.orientation.rotated_by(dx, dy, dz);
    }

    pub fn set_target_thetax(&mut self, thetax: f64) {
        self.orientation = self.orientation.with_thetax(thetax);
    }

    pub fn set_target_thetay(&mut self, thetay: f64) {
        self.orientation = self.orientation.with_thetay(thetay);
    }

    pub fn set_target_thetaz(&mut self, thetaz: f64) {
        self.orientation = self.orientation.with_thetaz(thetaz);
    }

    /// Restores the identity orientation, with all angles exactly zero.
    pub fn reset_target_orientation(&mut self) {
        self.orientation = Orientation::identity();
    }

    /// Sets the standard orientation: the crystal is rolled about the beam
    /// axis until the transverse part of the primary reciprocal vector is
    /// vertical, then tilted by [`STANDARD_TILT`] about the vertical axis.
    /// A subsequent [`set_coherent_edge`](Self::set_coherent_edge) then
    /// tilts it about the horizontal axis only.
    pub fn align_target(&mut self) {
        let g = self.lattice.primary();
        self.orientation = Orientation::from_angles(0.0, STANDARD_TILT, g[0].atan2(g[1]));
    }

    /// The primary reciprocal vector in the beam frame, units of the electron mass.
    pub(super) fn rotated_primary(&self) -> ThreeVector {
        self.orientation.to_beam_frame(self.lattice.primary())
    }

    /// Finds the orientation that puts the primary coherent edge at
    /// `peak_energy` (GeV), keeping the current thetay and thetaz and
    /// choosing the thetax of smallest magnitude.
    pub fn solve_coherent_edge(&self, peak_energy: f64) -> Result<Orientation, RadiatorError> {
        let energy = self.beam_energy;
        if !(peak_energy > 0.0 && peak_energy < energy) {
            return Err(RadiatorError::config("coherent edge", peak_energy, &format!("in (0, {}) GeV", energy)));
        }

        let delta = self.delta(peak_energy / energy);
        let (thetay, thetaz) = (self.orientation.thetay(), self.orientation.thetaz());

        // The rotation around x mixes only the y and z components of
        // w = Ry Rz g, so the longitudinal component after it is
        // rho sin(thetax + psi).
        let w = RotationMatrix::around_y(thetay) * RotationMatrix::around_z(thetaz) * self.lattice.primary();
        let rho = w[1].hypot(w[2]);
        if !(rho > delta) {
            return Err(RadiatorError::config(
                "coherent edge", peak_energy,
                "an energy the primary reciprocal vector can reach at this thetay, thetaz",
            ));
        }

        let psi = w[2].atan2(w[1]);
        let chi = (delta / rho).asin();
        let thetax = [wrap(chi - psi), wrap(std::f64::consts::PI - chi - psi)]
            .iter()
            .copied()
            .min_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);

        let orientation = Orientation::from_angles(thetax, thetay, thetaz);
        let gl = orientation.to_beam_frame(self.lattice.primary())[2];

        if (gl - delta).abs() > EDGE_TOLERANCE * delta {
            return Err(RadiatorError::convergence("coherent edge orientation", gl / delta));
        }

        Ok(orientation)
    }

    /// Rotates the radiator so that the primary coherent edge falls at
    /// `peak_energy` (GeV). On failure, the orientation is unchanged.
    pub fn set_coherent_edge(&mut self, peak_energy: f64) -> Result<(), RadiatorError> {
        self.orientation = self.solve_coherent_edge(peak_energy)?;
        Ok(())
    }

    /// Photon energy (GeV) of the primary coherent edge at the current
    /// orientation and beam energy.
    pub fn coherent_edge(&self) -> Result<f64, RadiatorError> {
        let gl = self.rotated_primary()[2].abs();
        if gl == 0.0 {
            return Err(RadiatorError::degenerate("primary reciprocal vector is transverse to the beam"));
        }
        let r = 2.0 * self.beam_energy * gl / ELECTRON_MASS;
        Ok(self.beam_energy * r / (1.0 + r))
    }
}
