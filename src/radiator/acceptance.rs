//! Transmission of photons through a circular collimator, for a beam
//! spot that is Gaussian on the collimator face.
//!
//! The spot width combines the RMS beam size with the angular spread
//! the electrons acquire by multiple scattering in the radiator:
//! sigma^2 = spotrms^2 + D^2 sigma2_ms(thickness).

use std::f64::consts;

use crate::error::{RadiatorError, check_theta2};
use crate::quadrature::{composite_gauss, integrate_2d};
use crate::special_functions::BesselI;
use super::{CollimatorOverride, RadiatorModel};

/// Spot profiles are truncated at this many standard deviations.
const NSIGMA: f64 = 8.0;

/// A circular aperture at a distance from the radiator, and the width
/// of the beam spot on it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aperture {
    /// Distance from the radiator, m
    pub distance: f64,
    /// Radius of the aperture, m
    pub radius: f64,
    /// RMS width (per axis) of the beam spot on the aperture, m
    pub sigma: f64,
}

impl Aperture {
    /// Where a photon emitted at polar angle `theta` and azimuth `phi`
    /// lands, relative to the spot centre shifted by (xshift, yshift):
    /// returns the distance from the centre of the aperture.
    fn offset(&self, theta: f64, phi: f64, xshift: f64, yshift: f64) -> f64 {
        let (s, c) = phi.sin_cos();
        let dx = self.distance * theta * c - xshift;
        let dy = self.distance * theta * s - yshift;
        dx.hypot(dy)
    }

    fn step(&self, rho: f64) -> f64 {
        if rho < self.radius {
            1.0
        } else if rho == self.radius {
            0.5
        } else {
            0.0
        }
    }

    /// Probability that a photon whose ray would hit the aperture plane at
    /// distance `rho` from its centre, if the spot were a point, passes
    /// through it.
    ///
    /// Integrates the Rice distribution of radial distances
    /// (r/s^2) exp[-(r^2 + rho^2)/2s^2] I0(r rho / s^2) over the aperture.
    fn radial(&self, rho: f64) -> f64 {
        let sigma = self.sigma;
        if sigma <= 0.0 {
            return self.step(rho);
        }

        let lower = (rho - NSIGMA * sigma).max(0.0);
        let upper = (rho + NSIGMA * sigma).min(self.radius);
        if upper <= lower {
            return 0.0;
        }
        if rho + NSIGMA * sigma <= self.radius {
            return 1.0;
        }

        let s2 = sigma * sigma;
        let panels = ((upper - lower) / sigma).ceil() as usize;
        let integral = composite_gauss(
            |r| {
                let z = r * rho / s2;
                r / s2 * (-(r - rho).powi(2) / (2.0 * s2)).exp() * z.i0e()
            },
            lower, upper, panels,
        );

        integral.clamp(0.0, 1.0)
    }

    /// Transmission probability for emission angle `theta` (rad) at
    /// azimuth `phi`, with the spot centre displaced by (xshift, yshift) m.
    pub fn transmission(&self, theta: f64, phi: f64, xshift: f64, yshift: f64) -> f64 {
        self.radial(self.offset(theta, phi, xshift, yshift))
    }

    /// As [`transmission`](Self::transmission), but evaluated by
    /// adaptive integration of the spot over the aperture in two dimensions.
    pub fn transmission_2d(&self, theta: f64, phi: f64, xshift: f64, yshift: f64) -> f64 {
        let rho = self.offset(theta, phi, xshift, yshift);
        let sigma = self.sigma;
        if sigma <= 0.0 {
            return self.step(rho);
        }
        if rho - NSIGMA * sigma >= self.radius {
            return 0.0;
        }

        let s2 = sigma * sigma;
        // spot centred at azimuth 0, the integral being symmetric in phi
        let (integral, _) = integrate_2d(
            |r, phi| {
                let d2 = (r - rho).powi(2) + 2.0 * r * rho * (1.0 - phi.cos());
                r * (-d2 / (2.0 * s2)).exp() / (2.0 * consts::PI * s2)
            },
            0.0, self.radius, -consts::PI, consts::PI,
            1.0e-6, 400,
        );

        integral.clamp(0.0, 1.0)
    }
}

impl RadiatorModel {
    /// RMS width (m) of the beam spot on a collimator at `distance` m,
    /// including multiple scattering in the radiator.
    fn spot_sigma_at(&self, distance: f64) -> Result<f64, RadiatorError> {
        let ms = self.sigma2_ms(self.target_thickness)?;
        Ok((self.collimator_spotrms.powi(2) + distance * distance * ms).sqrt())
    }

    /// RMS width (m) of the beam spot on the collimator, including
    /// multiple scattering in the radiator.
    pub fn spot_sigma(&self) -> Result<f64, RadiatorError> {
        self.spot_sigma_at(self.collimator_distance)
    }

    /// The collimator, with any overridden dimensions applied.
    pub fn aperture(&self, over: &CollimatorOverride) -> Result<Aperture, RadiatorError> {
        let distance = match over.distance {
            Some(d) if d > 0.0 && d.is_finite() => d,
            Some(d) => return Err(RadiatorError::config("collimator distance", d, "> 0 m")),
            None => self.collimator_distance,
        };
        let diameter = match over.diameter {
            Some(d) if d > 0.0 && d.is_finite() => d,
            Some(d) => return Err(RadiatorError::config("collimator diameter", d, "> 0 m")),
            None => self.collimator_diameter,
        };

        Ok(Aperture {
            distance,
            radius: 0.5 * diameter,
            sigma: self.spot_sigma_at(distance)?,
        })
    }

    /// The aperture rates should be weighted by, if any: present when
    /// collimated flux is requested or when any dimension is overridden.
    pub(super) fn active_aperture(&self, over: &CollimatorOverride) -> Result<Option<Aperture>, RadiatorError> {
        if self.collimated || !over.is_empty() {
            self.aperture(over).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Probability that a photon emitted at squared angle `theta2` (rad^2)
    /// and azimuth `phi` passes through the collimator, when the beam spot
    /// is displaced by (xshift, yshift) m from the collimator axis.
    pub fn acceptance(&self, theta2: f64, phi: f64, xshift: f64, yshift: f64) -> Result<f64, RadiatorError> {
        let theta2 = check_theta2(theta2)?;
        let aperture = self.aperture(&CollimatorOverride::none())?;
        Ok(aperture.transmission(theta2.sqrt(), phi, xshift, yshift))
    }

    /// Acceptance for a spot centred on the collimator axis.
    pub fn acceptance_on_axis(&self, theta2: f64) -> Result<f64, RadiatorError> {
        self.acceptance(theta2, 0.0, 0.0, 0.0)
    }

    /// Acceptance evaluated by direct two-dimensional integration, as
    /// a cross-check of [`acceptance`](Self::acceptance).
    pub fn acceptance_2d(&self, theta2: f64, phi: f64, xshift: f64, yshift: f64) -> Result<f64, RadiatorError> {
        let theta2 = check_theta2(theta2)?;
        let aperture = self.aperture(&CollimatorOverride::none())?;
        Ok(aperture.transmission_2d(theta2.sqrt(), phi, xshift, yshift))
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rand_distr::StandardNormal;
    use rand_xoshiro::Xoshiro256StarStar;
    use crate::constants::ELECTRON_MASS;
    use super::*;

    #[test]
    fn spot_size() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        let sigma = model.spot_sigma().unwrap();
        println!("sigma = {:.4e} m", sigma);
        assert!((sigma - 8.23e-4).abs() < 0.05e-4);
    }

    #[test]
    fn acceptance_limits() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        let on_axis = model.acceptance_on_axis(0.0).unwrap();
        println!("A(0) = {:.6}", on_axis);
        assert!(on_axis > 0.5 && on_axis <= 1.0);

        // far outside the aperture
        assert_eq!(model.acceptance_on_axis(1.0e-6).unwrap(), 0.0);

        // monotonic in angle for a centred spot
        let gamma = 12.0 / ELECTRON_MASS;
        let mut last = on_axis;
        for i in 1..20 {
            let theta = 0.2 * (i as f64) / gamma;
            let a = model.acceptance_on_axis(theta * theta).unwrap();
            assert!(a <= last + 1.0e-12);
            last = a;
        }

        // a point-like spot gives a hard edge
        model.set_collimator_spotrms(0.0).unwrap();
        model.set_target_thickness(1.0e-12).unwrap();
        let r = 0.5 * model.collimator_diameter() / model.collimator_distance();
        assert!(model.acceptance_on_axis((0.99 * r).powi(2)).unwrap() > 0.999);
        assert!(model.acceptance_on_axis((1.01 * r).powi(2)).unwrap() < 0.001);

        assert!(model.acceptance(-1.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn radial_and_2d_integrals_agree() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        let shifts = [(0.0, 0.0), (2.0e-4, 0.0), (-3.0e-4, 5.0e-4)];
        for (xs, ys) in shifts.iter() {
            for i in 0..6 {
                let theta = 5.0e-6 * (i as f64);
                let phi = 0.4 * (i as f64);
                let a = model.acceptance(theta * theta, phi, *xs, *ys).unwrap();
                let b = model.acceptance_2d(theta * theta, phi, *xs, *ys).unwrap();
                println!("theta = {:.1e}, shift = ({:.1e}, {:.1e}): {:.6} vs {:.6}", theta, xs, ys, a, b);
                assert!((a - b).abs() < 1.0e-4);
            }
        }
    }

    #[test]
    fn monte_carlo_acceptance() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        let aperture = model.aperture(&CollimatorOverride::none()).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);

        let theta = 1.5e-5;
        let phi: f64 = 1.0;
        let n = 200_000;
        let hits = (0..n)
            .filter(|_| {
                let dx: f64 = rng.sample(StandardNormal);
                let dy: f64 = rng.sample(StandardNormal);
                let x = aperture.distance * theta * phi.cos() + aperture.sigma * dx;
                let y = aperture.distance * theta * phi.sin() + aperture.sigma * dy;
                x.hypot(y) < aperture.radius
            })
            .count();

        let mc = (hits as f64) / (n as f64);
        let exact = model.acceptance(theta * theta, phi, 0.0, 0.0).unwrap();
        let error = (mc * (1.0 - mc) / (n as f64)).sqrt();
        println!("MC = {:.5} +/- {:.5}, quadrature = {:.5}", mc, error, exact);
        assert!((mc - exact).abs() < 5.0 * error);
    }

    #[test]
    fn overrides() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        model.set_collimated_flux(false);
        assert!(model.active_aperture(&CollimatorOverride::none()).unwrap().is_none());

        let over = CollimatorOverride::none().with_diameter(5.0e-3);
        let aperture = model.active_aperture(&over).unwrap().unwrap();
        assert_eq!(aperture.radius, 2.5e-3);
        assert_eq!(aperture.distance, model.collimator_distance());

        assert!(model.aperture(&CollimatorOverride::none().with_distance(-1.0)).is_err());
    }
}
