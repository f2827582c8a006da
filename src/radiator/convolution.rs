//! Smearing of a tabulated spectrum by the angular spread of the beam
//! and the mosaic spread of the crystal.
//!
//! The coherent edge sits at x/(1-x) = 2 E g_l / m, where g_l is the
//! longitudinal projection of the primary reciprocal vector. Tilting the
//! beam by an angle dtheta changes g_l by |g| dtheta, so in the variable
//! u = ln(x/(1-x)) the edge shifts by dtheta / theta_c, with
//! theta_c = g_l / |g|. A Gaussian beam divergence sigma_theta therefore
//! becomes a Gaussian kernel of width sigma_theta / theta_c in u. Tilting
//! the crystal planes has the same effect, so the mosaic spread adds to
//! sigma_theta in quadrature.

use crate::error::RadiatorError;
use super::RadiatorModel;

/// Kernel weights are not evaluated beyond this many standard deviations.
const KERNEL_CUTOFF: f64 = 10.0;

/// Width of each bin, taken between the midpoints of its neighbours
/// and one-sided at the ends of the grid.
fn bin_widths(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    (0..n)
        .map(|i| {
            let lower = if i == 0 { x[0] } else { 0.5 * (x[i - 1] + x[i]) };
            let upper = if i + 1 == n { x[n - 1] } else { 0.5 * (x[i] + x[i + 1]) };
            upper - lower
        })
        .collect()
}

impl RadiatorModel {
    /// RMS angular divergence of the beam at the radiator, rad: the
    /// emittance divided by the spot size on the collimator. Zero if the
    /// emittance vanishes.
    pub fn beam_divergence(&self) -> Result<f64, RadiatorError> {
        if self.beam_emittance == 0.0 {
            Ok(0.0)
        } else if self.collimator_spotrms > 0.0 {
            Ok(self.beam_emittance / self.collimator_spotrms)
        } else {
            Err(RadiatorError::config("collimator spot size", self.collimator_spotrms, "> 0 m when the emittance is finite"))
        }
    }

    /// RMS angle (rad) between the beam and the crystal planes: the beam
    /// divergence and the mosaic spread of the crystal, added in quadrature.
    pub fn convolution_width(&self) -> Result<f64, RadiatorError> {
        Ok(self.beam_divergence()?.hypot(self.species.mosaic_spread))
    }

    /// Replaces `y`, a rate sampled on the grid `x`, with its convolution
    /// against the angular spread of beam and crystal, leaving `x` untouched.
    ///
    /// The grid must be strictly increasing and lie within (0, 1), but need
    /// not be uniform. The total sum of y dx is conserved: the kernel is
    /// renormalized over the grid, so content near the ends is not lost.
    /// A beam with zero emittance on a perfect crystal leaves `y` unchanged.
    pub fn apply_beam_crystal_convolution(&self, x: &[f64], y: &mut [f64]) -> Result<(), RadiatorError> {
        if x.len() != y.len() {
            return Err(RadiatorError::config("length of y", y.len(), &format!("{} (the length of x)", x.len())));
        }

        if let Some(bad) = x.iter().find(|v| !(**v > 0.0 && **v < 1.0)) {
            return Err(RadiatorError::kinematics("x", *bad, "(0, 1)"));
        }

        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(RadiatorError::config("x grid", "unsorted", "strictly increasing"));
        }

        let sigma_theta = self.convolution_width()?;
        if sigma_theta == 0.0 || x.len() < 2 {
            return Ok(());
        }

        let g = self.rotated_primary();
        let g_abs = g.norm_sqr().sqrt();
        let theta_c = if g_abs > 0.0 { g[2].abs() / g_abs } else { 0.0 };
        if theta_c == 0.0 {
            return Err(RadiatorError::degenerate("beam convolution with the primary vector transverse to the beam"));
        }
        let sigma_u = sigma_theta / theta_c;

        let dx = bin_widths(x);
        let u: Vec<f64> = x.iter().map(|v| (v / (1.0 - v)).ln()).collect();
        // width of each bin in u
        let du: Vec<f64> = x.iter().zip(dx.iter()).map(|(v, w)| w / (v * (1.0 - v))).collect();

        let n = x.len();
        let mut smeared = vec![0.0; n];

        for j in 0..n {
            let content = y[j] * dx[j];
            if content == 0.0 {
                continue;
            }

            let weights: Vec<(usize, f64)> = (0..n)
                .filter_map(|i| {
                    let z = (u[i] - u[j]) / sigma_u;
                    if z.abs() > KERNEL_CUTOFF {
                        None
                    } else {
                        Some((i, (-0.5 * z * z).exp() * du[i]))
                    }
                })
                .collect();

            // bin j always lies within its own kernel, so total > 0
            let total: f64 = weights.iter().map(|(_, w)| w).sum();
            for (i, w) in weights {
                smeared[i] += content * w / total;
            }
        }

        for i in 0..n {
            y[i] = smeared[i] / dx[i];
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::crystal::CrystalSpecies;
    use super::*;

    fn edge_spectrum(model: &RadiatorModel) -> (Vec<f64>, Vec<f64>) {
        // uneven grid, finer around the edge
        let mut x: Vec<f64> = (1..60).map(|i| 0.6 * (i as f64) / 60.0).collect();
        x.extend((0..200).map(|i| 0.6 + 0.3 * (i as f64) / 200.0));
        x.extend((0..10).map(|i| 0.9 + 0.09 * (i as f64) / 10.0));
        let y = x.iter().map(|v| model.rate_dncdx(*v).or_else(|e| e.estimate().ok_or(e)).unwrap()).collect();
        (x, y)
    }

    fn total(x: &[f64], y: &[f64]) -> f64 {
        bin_widths(x).iter().zip(y.iter()).map(|(w, v)| w * v).sum()
    }

    #[test]
    fn conserves_rate() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        model.set_collimated_flux(false);
        model.set_beam_emittance(10.0e-9).unwrap();
        let (x, y) = edge_spectrum(&model);

        let mut smeared = y.clone();
        let before = x.clone();
        model.apply_beam_crystal_convolution(&x, &mut smeared).unwrap();
        assert_eq!(x, before);

        let (a, b) = (total(&x, &y), total(&x, &smeared));
        println!("total rate {:.6e} -> {:.6e}", a, b);
        assert!(((a - b) / a).abs() < 1.0e-12);

        // the edge is blurred: the peak drops and the region just above fills in
        let peak = |v: &[f64]| v.iter().cloned().fold(0.0, f64::max);
        println!("peak {:.4e} -> {:.4e}", peak(&y), peak(&smeared));
        assert!(peak(&smeared) < peak(&y));
    }

    #[test]
    fn zero_width_is_identity() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        model.set_beam_emittance(0.0).unwrap();
        model.set_collimator_spotrms(0.0).unwrap();
        model.register_crystal(CrystalSpecies::diamond().with_mosaic_spread(0.0)).unwrap();
        model.set_target_crystal("diamond").unwrap();
        assert_eq!(model.convolution_width().unwrap(), 0.0);

        let x = vec![0.1, 0.2, 0.35, 0.5, 0.74, 0.75, 0.9];
        let y = vec![1.0, 2.0, 0.5, 0.0, 3.0, 4.0, 1.5];
        let mut z = y.clone();
        model.apply_beam_crystal_convolution(&x, &mut z).unwrap();
        assert_eq!(y, z);

        // a mosaic crystal smears even a perfect beam
        model.register_crystal(CrystalSpecies::diamond().with_mosaic_spread(1.0e-4)).unwrap();
        model.set_target_crystal("diamond").unwrap();
        assert_eq!(model.convolution_width().unwrap(), 1.0e-4);
        let mut z = y.clone();
        model.apply_beam_crystal_convolution(&x, &mut z).unwrap();
        assert!(z != y);
    }

    #[test]
    fn mosaic_spread_blurs_edge() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        model.set_collimated_flux(false);
        model.set_beam_emittance(0.0).unwrap();
        let (x, y) = edge_spectrum(&model);

        let peak = |v: &[f64]| v.iter().cloned().fold(0.0, f64::max);
        let mut previous = peak(&y);
        for mosaic in [20.0e-6, 1.0e-4, 1.0e-3].iter() {
            let mut mosaic_model = model.clone();
            mosaic_model.register_crystal(CrystalSpecies::diamond().with_mosaic_spread(*mosaic)).unwrap();
            mosaic_model.set_target_crystal("diamond").unwrap();

            let mut smeared = y.clone();
            mosaic_model.apply_beam_crystal_convolution(&x, &mut smeared).unwrap();
            println!("mosaic spread {:.1e} rad: peak {:.4e}", mosaic, peak(&smeared));
            assert!(peak(&smeared) < previous);
            assert!(((total(&x, &smeared) - total(&x, &y)) / total(&x, &y)).abs() < 1.0e-12);
            previous = peak(&smeared);
        }
    }

    #[test]
    fn rejects_bad_grids() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        let mut y = vec![1.0; 3];
        assert!(model.apply_beam_crystal_convolution(&[0.1, 0.2], &mut y).is_err());
        assert!(model.apply_beam_crystal_convolution(&[0.1, 0.3, 0.2], &mut y).is_err());
        assert!(model.apply_beam_crystal_convolution(&[0.0, 0.3, 0.5], &mut y).is_err());
        assert_eq!(y, vec![1.0; 3]);

        let mut model = model;
        model.set_collimator_spotrms(0.0).unwrap();
        assert!(model.apply_beam_crystal_convolution(&[0.1, 0.2, 0.3], &mut y).is_err());
    }
}
