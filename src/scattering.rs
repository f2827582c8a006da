//! Multiple Coulomb scattering of the electron beam in the radiator.
//!
//! Each formula returns the variance of the projected (plane) scattering
//! angle, theta_0^2 in rad^2, after a thickness of material.

use enum_dispatch::enum_dispatch;

use crate::constants::*;
use crate::crystal::CrystalSpecies;
use crate::error::RadiatorError;

/// The material and beam a scattering formula is evaluated for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScatteringTarget {
    /// Atomic number
    pub z: f64,
    /// Atomic mass, g/mol
    pub atomic_mass: f64,
    /// Density, g/cm^3
    pub density: f64,
    /// Radiation length, m
    pub radiation_length: f64,
    /// Thickness traversed, m
    pub thickness: f64,
    /// Beam momentum, GeV
    pub momentum: f64,
}

impl ScatteringTarget {
    pub fn new(species: &CrystalSpecies, thickness: f64, momentum: f64) -> Self {
        Self {
            z: species.z,
            atomic_mass: species.atomic_mass,
            density: species.density,
            radiation_length: species.radiation_length,
            thickness,
            momentum,
        }
    }

    /// Thickness in units of the radiation length
    pub fn t(&self) -> f64 {
        self.thickness / self.radiation_length
    }

    /// Areal density, g/cm^2
    pub fn areal_density(&self) -> f64 {
        100.0 * self.thickness * self.density
    }
}

#[enum_dispatch]
pub trait ScatteringFormula {
    /// Variance of the plane-projected scattering angle, rad^2
    fn theta0_sqr(&self, target: &ScatteringTarget) -> Result<f64, RadiatorError>;

    fn name(&self) -> &'static str;
}

/// Highland's formula, as given by the Particle Data Group.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pdg;

/// The parameterization of Kaune et al., fitted at low thickness.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Kaune;

/// Highland's formula with Urban's logarithmic correction,
/// as used in Geant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geant;

/// The Gaussian width of the Moliere distribution, following Hanson.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hanson;

impl ScatteringFormula for Pdg {
    fn theta0_sqr(&self, target: &ScatteringTarget) -> Result<f64, RadiatorError> {
        let t = checked_t(target)?;
        let theta0 = 0.0136 / target.momentum * t.sqrt() * (1.0 + 0.038 * t.ln());
        Ok(theta0 * theta0)
    }

    fn name(&self) -> &'static str {
        "PDG"
    }
}

impl ScatteringFormula for Kaune {
    fn theta0_sqr(&self, target: &ScatteringTarget) -> Result<f64, RadiatorError> {
        let t = checked_t(target)?;
        let theta0 = 0.0150 / target.momentum * t.sqrt() * (1.0 + t.log10() / 9.0);
        Ok(theta0 * theta0)
    }

    fn name(&self) -> &'static str {
        "Kaune"
    }
}

impl ScatteringFormula for Geant {
    fn theta0_sqr(&self, target: &ScatteringTarget) -> Result<f64, RadiatorError> {
        let t = checked_t(target)?;
        let log_t = t.ln();
        let correction = 1.0 + 0.105 * log_t + 0.0035 * log_t * log_t;
        let theta0 = 0.0136 / target.momentum * t.sqrt();
        Ok(theta0 * theta0 * correction.max(0.0))
    }

    fn name(&self) -> &'static str {
        "Geant"
    }
}

impl ScatteringFormula for Hanson {
    fn theta0_sqr(&self, target: &ScatteringTarget) -> Result<f64, RadiatorError> {
        checked_t(target)?;
        let z = target.z;
        let p = 1.0e3 * target.momentum; // MeV
        let chi_c2 = 0.157 * z * (z + 1.0) * target.areal_density() / (target.atomic_mass * p * p);
        let za = z * ALPHA_FINE;
        let chi_a2 = 2.007e-5 * z.powf(2.0 / 3.0) * (1.0 + 3.34 * za * za) / (p * p);

        // Solve B - ln B = ln(chi_c^2 / (1.167 chi_a^2)) for B > 1
        let omega = (chi_c2 / (1.167 * chi_a2)).ln();
        if !(omega > 1.0) {
            return Err(RadiatorError::convergence("Moliere B parameter: target too thin for multiple scattering", f64::NAN));
        }

        let mut b = omega + omega.ln().max(1.0);
        for _i in 0..50 {
            let step = (b - b.ln() - omega) / (1.0 - 1.0 / b);
            b -= step;
            if step.abs() < 1.0e-12 * b {
                // width of the central gaussian, projected onto a plane
                return Ok(0.5 * chi_c2 * (b - 1.2).max(0.0));
            }
        }

        Err(RadiatorError::convergence("Moliere B parameter", b))
    }

    fn name(&self) -> &'static str {
        "Hanson"
    }
}

fn checked_t(target: &ScatteringTarget) -> Result<f64, RadiatorError> {
    if !(target.thickness > 0.0) {
        return Err(RadiatorError::config("thickness", target.thickness, "> 0 m"));
    }
    if !(target.momentum > 0.0) {
        return Err(RadiatorError::config("beam energy", target.momentum, "> 0 GeV"));
    }
    Ok(target.t())
}

/// Selects one of the multiple-scattering parameterizations.
#[enum_dispatch(ScatteringFormula)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MultipleScattering {
    Kaune,
    Pdg,
    Geant,
    Hanson,
}

impl Default for MultipleScattering {
    fn default() -> Self {
        Geant.into()
    }
}

impl std::str::FromStr for MultipleScattering {
    type Err = RadiatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kaune" => Ok(Kaune.into()),
            "pdg" | "highland" => Ok(Pdg.into()),
            "geant" => Ok(Geant.into()),
            "hanson" | "moliere" => Ok(Hanson.into()),
            _ => Err(RadiatorError::config("multiple scattering model", s, "one of 'kaune', 'pdg', 'geant', 'hanson'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond(thickness: f64) -> ScatteringTarget {
        ScatteringTarget::new(&CrystalSpecies::diamond(), thickness, 12.0)
    }

    #[test]
    fn thin_targets_agree() {
        let x0 = CrystalSpecies::diamond().radiation_length;
        for t in [1.0e-3, 3.0e-3, 1.0e-2, 3.0e-2, 0.1].iter() {
            let target = diamond(t * x0);
            let pdg = Pdg.theta0_sqr(&target).unwrap();
            let hanson = Hanson.theta0_sqr(&target).unwrap();
            let ratio = (hanson / pdg).sqrt();
            println!("t = {:.1e} X0: theta0 = {:.3e} (PDG), {:.3e} (Hanson), ratio = {:.3}", t, pdg.sqrt(), hanson.sqrt(), ratio);
            assert!((ratio - 1.0).abs() < 0.2);
        }
    }

    #[test]
    fn default_is_geant() {
        let target = diamond(20.0e-6);
        let model = MultipleScattering::default();
        assert_eq!(model.name(), "Geant");
        assert_eq!(model.theta0_sqr(&target).unwrap(), Geant.theta0_sqr(&target).unwrap());
        let parsed: MultipleScattering = "Hanson".parse().unwrap();
        assert_eq!(parsed.name(), "Hanson");
        assert!("gaussian".parse::<MultipleScattering>().is_err());
    }

    #[test]
    fn formulas_scale_with_thickness() {
        let models: [MultipleScattering; 4] = [Kaune.into(), Pdg.into(), Geant.into(), Hanson.into()];
        for model in models.iter() {
            let thin = model.theta0_sqr(&diamond(20.0e-6)).unwrap();
            let thick = model.theta0_sqr(&diamond(200.0e-6)).unwrap();
            println!("{:>6}: theta0 = {:.3e} -> {:.3e}", model.name(), thin.sqrt(), thick.sqrt());
            assert!(thin > 0.0 && thick > thin);
            // roughly sqrt(t)
            assert!(thick / thin > 5.0 && thick / thin < 20.0);
        }
        assert!(Pdg.theta0_sqr(&diamond(0.0)).is_err());
    }
}
