//! Sampling of photon energies from a tabulated bremsstrahlung spectrum,
//! for use in a host Monte Carlo loop.

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::error::RadiatorError;
use crate::pwmci::MonotoneTable;
use crate::radiator::RadiatorModel;

/// The total rate dN/dx of a radiator, tabulated on a uniform grid in x
/// and integrated into a cumulative distribution that can be inverted.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumSampler {
    energy: f64,
    erms: f64,
    x: Vec<f64>,
    rate: Vec<f64>,
    cdf: MonotoneTable,
}

impl SpectrumSampler {
    /// Tabulates the total rate of `model` at `n` points between `xmin`
    /// and `xmax`, smeared by the beam divergence if `convolve` is set.
    ///
    /// Lattice sums that fall short of the model's tolerance contribute
    /// their partial sums. Polarized rates cannot be sampled, as they are
    /// not positive definite.
    pub fn new(model: &RadiatorModel, xmin: f64, xmax: f64, n: usize, convolve: bool) -> Result<Self, RadiatorError> {
        if model.polarized_flux() {
            return Err(RadiatorError::degenerate("sampling from a polarized rate"));
        }
        if !(xmin > 0.0 && xmin < xmax && xmax < 1.0) {
            return Err(RadiatorError::config("sampling range", format!("[{}, {}]", xmin, xmax), "0 < xmin < xmax < 1"));
        }
        if n < 3 {
            return Err(RadiatorError::config("number of sampling points", n, ">= 3"));
        }

        let dx = (xmax - xmin) / ((n - 1) as f64);
        let x: Vec<f64> = (0..n).map(|i| xmin + dx * (i as f64)).collect();

        let mut rate = x.iter()
            .map(|x| model.rate_dntdx(*x).or_else(|e| e.estimate().ok_or(e)).map(|r| r.max(0.0)))
            .collect::<Result<Vec<f64>, _>>()?;

        if convolve {
            model.apply_beam_crystal_convolution(&x, &mut rate)?;
        }

        // trapezoidal cumulative sum
        let mut table = Vec::with_capacity(n);
        let mut total = 0.0;
        table.push([x[0], 0.0]);
        for i in 1..n {
            total += 0.5 * (rate[i - 1] + rate[i]) * (x[i] - x[i - 1]);
            table.push([x[i], total]);
        }

        if !(total > 0.0) {
            return Err(RadiatorError::degenerate("sampling a spectrum with no photons in range"));
        }

        let cdf = MonotoneTable::new(table)
            .ok_or_else(|| RadiatorError::degenerate("cumulative spectrum is not monotonic"))?;

        Ok(SpectrumSampler {
            energy: model.beam_energy(),
            erms: model.beam_erms(),
            x,
            rate,
            cdf,
        })
    }

    /// Tabulated energy fractions.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Tabulated rates dN/dx, per electron.
    pub fn rate(&self) -> &[f64] {
        &self.rate
    }

    /// Number of photons per electron emitted within the tabulated range.
    pub fn integrated_rate(&self) -> f64 {
        self.cdf.last()[1]
    }

    /// Fraction of the emitted photons with energy fraction below `x`,
    /// or `None` outside the tabulated range.
    pub fn cumulative(&self, x: f64) -> Option<f64> {
        self.cdf.evaluate(x).map(|f| f / self.integrated_rate())
    }

    /// Draws an energy fraction x from the tabulated spectrum.
    pub fn sample_fraction<R: Rng>(&self, rng: &mut R) -> f64 {
        let target = self.integrated_rate() * rng.gen::<f64>();
        self.cdf.invert(target).unwrap_or_else(|| self.cdf.first()[0])
    }

    /// Draws an electron energy, smeared by the beam energy spread, and the
    /// energy of the photon it emits, both in GeV.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        let x = self.sample_fraction(rng);
        let energy = if self.erms > 0.0 {
            self.energy + self.erms * rng.sample::<f64,_>(StandardNormal)
        } else {
            self.energy
        };
        (energy, x * energy)
    }
}
