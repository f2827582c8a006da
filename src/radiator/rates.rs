//! Photon emission rates dN/dx per electron, coherent and incoherent,
//! and their angular and polarization structure.

use std::f64::consts;

use crate::constants::*;
use crate::error::{RadiatorError, check_fraction, check_theta2};
use crate::geometry::StokesVector;
use crate::lattice::{LatticeSum, LatticeTerm};
use crate::quadrature::{composite_gauss, piecewise_gauss};
use super::{Aperture, CollimatorOverride, RadiatorModel};

/// Vectors whose longitudinal component falls short of the minimum
/// momentum transfer by less than this fraction are kept, at threshold.
const THRESHOLD_SLACK: f64 = 1.0e-12;

/// Number of log-spaced panels in the incoherent form-factor integrals.
const PSI_PANELS: usize = 24;

/// Angular integrals run over ln(y^2) in this range, y = gamma theta.
const LN_Y2_RANGE: [f64; 2] = [-12.0, 12.0];

/// Panel width, in ln(y^2), of the angular integrals.
const LN_Y2_STEP: f64 = 0.5;

impl RadiatorModel {
    /// n t alpha Z^2 r_e^2 / x: converts dimensionless cross sections
    /// into photons per electron per unit x.
    fn rate_prefactor(&self, x: f64) -> f64 {
        let z = self.species.z;
        let r_e = CLASSICAL_ELECTRON_RADIUS;
        self.species.number_density() * self.target_thickness * ALPHA_FINE * z * z * r_e * r_e / x
    }

    /// Azimuth, in the beam frame, of the transverse part of the primary
    /// reciprocal vector: the reference direction for polarized rates.
    fn reference_azimuth(&self) -> f64 {
        self.rotated_primary().azimuth()
    }

    fn lattice_sum(&self, x: f64, aperture: Option<&Aperture>) -> LatticeSum {
        let delta = self.delta(x);
        let gamma = self.gamma();
        let phi0 = self.reference_azimuth();
        let norm = self.rate_prefactor(x) * self.lattice.cell_norm();
        let y = 1.0 - x;

        let mut sum = LatticeSum::default();

        for v in self.lattice.rotated(&self.orientation) {
            let gl = v.g[2];
            if gl < delta * (1.0 - THRESHOLD_SLACK) {
                continue;
            }
            let gl = gl.max(delta);
            let gt2 = v.g.perp_sqr();

            let theta2 = (gl / delta - 1.0) / (gamma * gamma);
            let phi = v.g.azimuth();
            let acceptance = match aperture {
                Some(a) => a.transmission(theta2.sqrt(), phi, 0.0, 0.0),
                None => 1.0,
            };

            let k1 = gt2 * delta / gl.powi(2);
            let k2 = 6.0 * gt2 * delta.powi(2) * (gl - delta) / gl.powi(4);
            let k3 = gt2 * delta.powi(3) / gl.powi(4);

            let unpolarized = norm * v.strength * acceptance * ((1.0 + y * y) * k1 - (2.0 / 3.0) * y * k2);
            let polarized = norm * v.strength * acceptance * 2.0 * y * k3;

            sum.unpolarized += unpolarized;
            sum.polarized += polarized * (2.0 * (phi - phi0)).cos();
            sum.terms.push(LatticeTerm {
                hkl: v.hkl,
                q2: v.g.norm_sqr(),
                theta2,
                phi,
                weight: unpolarized,
                polarized,
            });
        }

        sum
    }

    /// Coherent rate for the given aperture, failing if the lattice sum
    /// has not converged. The error carries the rate that was requested.
    fn coherent_rate(&self, x: f64, aperture: Option<&Aperture>, polarized: bool) -> Result<f64, RadiatorError> {
        let sum = self.lattice_sum(x, aperture);
        let value = if polarized { sum.polarized } else { sum.unpolarized };
        match sum.converged(self.lattice.max_shell(), self.lattice_tolerance) {
            Ok(_) => Ok(value),
            Err(RadiatorError::Convergence(what, _)) => Err(RadiatorError::Convergence(what, value)),
            Err(e) => Err(e),
        }
    }

    /// Evaluates the coherent lattice sum at `x`, with the stored collimation
    /// setting, returning the individual terms alongside the unpolarized
    /// and polarized coherent rates.
    pub fn coherent_lattice_sum(&self, x: f64) -> Result<LatticeSum, RadiatorError> {
        self.coherent_lattice_sum_with(x, &CollimatorOverride::none())
    }

    pub fn coherent_lattice_sum_with(&self, x: f64, over: &CollimatorOverride) -> Result<LatticeSum, RadiatorError> {
        let x = check_fraction(x)?;
        let aperture = self.active_aperture(over)?;
        self.lattice_sum(x, aperture.as_ref())
            .converged(self.lattice.max_shell(), self.lattice_tolerance)
    }

    /// Coherent rate dN/dx. In polarized mode, returns the polarized part:
    /// the difference between the rates polarized parallel and perpendicular
    /// to the plane of the primary reciprocal vector.
    pub fn rate_dncdx(&self, x: f64) -> Result<f64, RadiatorError> {
        self.rate_dncdx_with(x, &CollimatorOverride::none())
    }

    pub fn rate_dncdx_with(&self, x: f64, over: &CollimatorOverride) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let aperture = self.active_aperture(over)?;
        self.coherent_rate(x, aperture.as_ref(), self.polarized)
    }

    /// Coherent rate dN/dx dphi, differential in the azimuth `phi` of the
    /// polarization vector. Integrates over phi to the unpolarized rate.
    pub fn rate_dncdxdp(&self, x: f64, phi: f64) -> Result<f64, RadiatorError> {
        let sum = self.coherent_lattice_sum(x)?;
        let density: f64 = sum.terms.iter()
            .map(|t| t.weight + t.polarized * (2.0 * (phi - t.phi)).cos())
            .sum();
        Ok(density / (2.0 * consts::PI))
    }

    /// The incoherent form-factor integrals psi_1 and psi_2 of the nuclear
    /// cross section, for screened atoms bound in a vibrating lattice.
    fn incoherent_psi(&self, x: f64) -> (f64, f64) {
        let delta = self.delta(x);
        if delta >= 1.0 {
            return (4.0, 10.0 / 3.0);
        }

        let beta2 = self.species.form_factor_beta.powi(2);
        let dw = self.species.debye_waller_constant_me();
        let screening = |q: f64| {
            let b = beta2 * q * q;
            (b / (1.0 + b)).powi(2) * -(-dw * q * q).exp_m1()
        };

        let breaks: Vec<f64> = (0..=PSI_PANELS)
            .map(|i| delta * delta.powf(-(i as f64) / (PSI_PANELS as f64)))
            .collect();

        let d2 = delta * delta;
        let psi1 = 4.0 + 4.0 * piecewise_gauss(
            |q| (q - delta).powi(2) * screening(q) / q.powi(3),
            &breaks,
        );
        let psi2 = 10.0 / 3.0 + 4.0 * piecewise_gauss(
            |q| (q.powi(3) - 6.0 * d2 * q * (q / delta).ln() + 3.0 * d2 * q - 4.0 * d2 * delta) * screening(q) / q.powi(4),
            &breaks,
        );

        (psi1, psi2)
    }

    /// Incoherent nuclear rate dN/dx, unpolarized and uncollimated.
    fn nuclear_rate(&self, x: f64) -> f64 {
        let (psi1, psi2) = self.incoherent_psi(x);
        let y = 1.0 - x;
        self.rate_prefactor(x) * ((1.0 + y * y) * psi1 - (2.0 / 3.0) * y * psi2)
    }

    /// Bremsstrahlung on atomic electrons dN/dx, unpolarized and
    /// uncollimated, in complete screening.
    fn inelastic_rate(&self, x: f64) -> f64 {
        let z = self.species.z;
        let r_e = CLASSICAL_ELECTRON_RADIUS;
        let log = (1194.0 * z.powf(-2.0 / 3.0)).ln();
        let shape = (4.0 / 3.0 - 4.0 * x / 3.0 + x * x) * log + (1.0 - x) / 9.0;
        self.species.number_density() * self.target_thickness * 4.0 * ALPHA_FINE * z * r_e * r_e / x * shape
    }

    /// Schiff's angular distribution of bremsstrahlung, at y^2 = (gamma theta)^2,
    /// and the difference between its components polarized in and
    /// normal to the emission plane.
    fn schiff(&self, x: f64, y2: f64) -> (f64, f64) {
        let delta = self.delta(x);
        let beta = self.species.form_factor_beta;
        let u = 1.0 + y2;
        let inv_m2 = delta * delta + (1.0 / (beta * u)).powi(2);
        let ln_m = -0.5 * inv_m2.ln();
        let y = 1.0 - x;

        let f = 16.0 * y2 * y / u.powi(4) - (2.0 - x).powi(2) / u.powi(2)
            + ((1.0 + y * y) / u.powi(2) - 4.0 * y2 * y / u.powi(4)) * ln_m;
        let t = 4.0 * y2 * y * (4.0 - ln_m) / u.powi(4);

        (f.max(0.0), t)
    }

    /// Integral of the angular distribution over y^2.
    fn schiff_norm(&self, x: f64) -> Result<f64, RadiatorError> {
        let [lo, hi] = LN_Y2_RANGE;
        let panels = ((hi - lo) / LN_Y2_STEP).ceil() as usize;
        let norm = composite_gauss(|s| { let y2 = s.exp(); self.schiff(x, y2).0 * y2 }, lo, hi, panels);
        if norm > 0.0 {
            Ok(norm)
        } else {
            Err(RadiatorError::degenerate("angular distribution of incoherent bremsstrahlung vanishes"))
        }
    }

    /// Fraction of incoherent photons that pass through the aperture.
    fn angular_fraction(&self, x: f64, aperture: &Aperture) -> Result<f64, RadiatorError> {
        let gamma = self.gamma();
        let theta_max = (aperture.radius + 8.0 * aperture.sigma) / aperture.distance;
        let [lo, hi] = LN_Y2_RANGE;
        let hi = hi.min((gamma * theta_max).powi(2).ln());
        if hi <= lo {
            return Ok(0.0);
        }

        let panels = ((hi - lo) / LN_Y2_STEP).ceil() as usize;
        let accepted = composite_gauss(
            |s| {
                let y2 = s.exp();
                let theta = y2.sqrt() / gamma;
                self.schiff(x, y2).0 * y2 * aperture.transmission(theta, 0.0, 0.0, 0.0)
            },
            lo, hi, panels,
        );

        Ok((accepted / self.schiff_norm(x)?).clamp(0.0, 1.0))
    }

    /// Nuclear and electronic incoherent rates, in that order.
    fn incoherent_rates(&self, x: f64, aperture: Option<&Aperture>, polarized: bool) -> Result<(f64, f64), RadiatorError> {
        if polarized {
            return Ok((0.0, 0.0));
        }
        let fraction = match aperture {
            Some(a) => self.angular_fraction(x, a)?,
            None => 1.0,
        };
        Ok((fraction * self.nuclear_rate(x), fraction * self.inelastic_rate(x)))
    }

    /// Incoherent bremsstrahlung rate dN/dx on nuclei. Unpolarized, so zero
    /// in polarized mode.
    pub fn rate_dnidx(&self, x: f64) -> Result<f64, RadiatorError> {
        self.rate_dnidx_with(x, &CollimatorOverride::none())
    }

    pub fn rate_dnidx_with(&self, x: f64, over: &CollimatorOverride) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let aperture = self.active_aperture(over)?;
        self.incoherent_rates(x, aperture.as_ref(), self.polarized).map(|(n, _)| n)
    }

    /// Bremsstrahlung rate dN/dx on atomic electrons. Unpolarized, so zero
    /// in polarized mode.
    pub fn rate_dnbidx(&self, x: f64) -> Result<f64, RadiatorError> {
        self.rate_dnbidx_with(x, &CollimatorOverride::none())
    }

    pub fn rate_dnbidx_with(&self, x: f64, over: &CollimatorOverride) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let aperture = self.active_aperture(over)?;
        self.incoherent_rates(x, aperture.as_ref(), self.polarized).map(|(_, e)| e)
    }

    /// Incoherent nuclear rate dN/dx dtheta^2, including the collimator
    /// acceptance if collimated flux is selected.
    pub fn rate_dnidxdt2(&self, x: f64, theta2: f64) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let theta2 = check_theta2(theta2)?;
        if self.polarized {
            return Ok(0.0);
        }

        let gamma2 = self.gamma().powi(2);
        let (f, _) = self.schiff(x, gamma2 * theta2);
        let acceptance = match self.active_aperture(&CollimatorOverride::none())? {
            Some(a) => a.transmission(theta2.sqrt(), 0.0, 0.0, 0.0),
            None => 1.0,
        };

        Ok(self.nuclear_rate(x) * gamma2 * f / self.schiff_norm(x)? * acceptance)
    }

    /// Components of the incoherent rate at (x, theta2), per unit theta^2
    /// and per radian of emission azimuth phi, polarized parallel and
    /// perpendicular to the reference (x-z) plane.
    fn incoherent_stokes(&self, x: f64, theta2: f64, phi: f64) -> Result<StokesVector, RadiatorError> {
        let x = check_fraction(x)?;
        let theta2 = check_theta2(theta2)?;

        let gamma2 = self.gamma().powi(2);
        let (f, t) = self.schiff(x, gamma2 * theta2);
        let in_plane = (0.5 * (f + t)).max(0.0);
        let normal = (0.5 * (f - t)).max(0.0);

        let acceptance = match self.active_aperture(&CollimatorOverride::none())? {
            Some(a) => a.transmission(theta2.sqrt(), phi, 0.0, 0.0),
            None => 1.0,
        };
        let scale = self.nuclear_rate(x) * gamma2 / self.schiff_norm(x)? * acceptance / (2.0 * consts::PI);

        let stokes = StokesVector::from_intensities(in_plane, normal).rotate_by(phi);
        Ok(stokes * scale)
    }

    /// Incoherent rate dN/dx dtheta^2 dphi polarized parallel to the
    /// reference plane, for emission at azimuth `phi`.
    pub fn rate_para(&self, x: f64, theta2: f64, phi: f64) -> Result<f64, RadiatorError> {
        self.incoherent_stokes(x, theta2, phi).map(|s| s.parallel())
    }

    /// As [`rate_para`](Self::rate_para), polarized perpendicular to the
    /// reference plane.
    pub fn rate_ortho(&self, x: f64, theta2: f64, phi: f64) -> Result<f64, RadiatorError> {
        self.incoherent_stokes(x, theta2, phi).map(|s| s.perpendicular())
    }

    /// Linear polarization of incoherent photons at (x, theta2), in the
    /// emission plane: (para - ortho) / (para + ortho) at phi = 0.
    pub fn polarization(&self, x: f64, theta2: f64) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let theta2 = check_theta2(theta2)?;
        let (f, t) = self.schiff(x, self.gamma().powi(2) * theta2);
        if f <= f64::EPSILON * t.abs() || f <= f64::MIN_POSITIVE {
            return Err(RadiatorError::degenerate("polarization where the incoherent rate vanishes"));
        }
        Ok((t / f).clamp(-1.0, 1.0))
    }

    /// Ratio of the total (coherent plus incoherent) to the incoherent
    /// rate, unpolarized, for the stored collimation setting.
    pub fn coherent_enhancement(&self, x: f64) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let aperture = self.active_aperture(&CollimatorOverride::none())?;
        let coherent = self.coherent_rate(x, aperture.as_ref(), false)?;
        let (nuclear, electronic) = self.incoherent_rates(x, aperture.as_ref(), false)?;
        let incoherent = nuclear + electronic;
        if !(incoherent > 0.0) {
            return Err(RadiatorError::degenerate("coherent enhancement where the incoherent rate vanishes"));
        }
        Ok((coherent + incoherent) / incoherent)
    }

    /// Total rate dN/dx: coherent, incoherent nuclear and electronic parts.
    /// A convergence error carries the total with the partial coherent sum.
    pub fn rate_dntdx(&self, x: f64) -> Result<f64, RadiatorError> {
        self.rate_dntdx_with(x, &CollimatorOverride::none())
    }

    pub fn rate_dntdx_with(&self, x: f64, over: &CollimatorOverride) -> Result<f64, RadiatorError> {
        let x = check_fraction(x)?;
        let aperture = self.active_aperture(over)?;
        let (nuclear, electronic) = self.incoherent_rates(x, aperture.as_ref(), self.polarized)?;
        match self.coherent_rate(x, aperture.as_ref(), self.polarized) {
            Ok(coherent) => Ok(coherent + nuclear + electronic),
            Err(RadiatorError::Convergence(what, coherent)) => {
                Err(RadiatorError::Convergence(what, coherent + nuclear + electronic))
            },
            Err(e) => Err(e),
        }
    }

    /// Total rate dN/dk per GeV of photon energy `k`.
    pub fn rate_dntdk(&self, k: f64) -> Result<f64, RadiatorError> {
        let energy = self.beam_energy;
        if !(k > 0.0 && k < energy) {
            return Err(RadiatorError::kinematics("k", k, &format!("(0, {}) GeV", energy)));
        }
        let rate = self.rate_dntdx(k / energy);
        match rate {
            Ok(r) => Ok(r / energy),
            Err(RadiatorError::Convergence(what, r)) => Err(RadiatorError::Convergence(what, r / energy)),
            Err(e) => Err(e),
        }
    }
}
