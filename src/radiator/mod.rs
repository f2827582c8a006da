//! Coherent bremsstrahlung from a crystal radiator, viewed through a
//! downstream collimator.
//!
//! Units throughout: lengths in m, energies and momenta in GeV, angles
//! in rad. Photon energies are given as the fraction `x = k / E` of the
//! beam energy `E`.
//!
//! A `RadiatorModel` is a plain value: cloning it yields an independent
//! copy, so parallel workers should each own a clone. It has no interior
//! mutability, so queries (`&self`) may run concurrently with each other,
//! but setters (`&mut self`) need exclusive access, which the borrow
//! checker enforces.

use std::fmt::Write;
use colored::Colorize;

use crate::constants::*;
use crate::crystal::{CrystalSpecies, CrystalTable};
use crate::error::RadiatorError;
use crate::geometry::Orientation;
use crate::lattice::{ReciprocalLattice, SHELL_TOLERANCE};
use crate::scattering::{MultipleScattering, ScatteringFormula, ScatteringTarget, Kaune, Pdg, Geant, Hanson};

mod acceptance;
mod convolution;
mod orientation;
mod rates;

pub use acceptance::Aperture;
pub use orientation::STANDARD_TILT;

/// Overrides the stored collimator geometry for a single rate query.
/// Setting either field forces the collimated rate to be evaluated,
/// whatever the collimated-flux flag says; unset fields fall back to
/// the stored configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CollimatorOverride {
    pub distance: Option<f64>,
    pub diameter: Option<f64>,
}

impl CollimatorOverride {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_distance(self, distance: f64) -> Self {
        Self { distance: Some(distance), ..self }
    }

    pub fn with_diameter(self, diameter: f64) -> Self {
        Self { diameter: Some(diameter), ..self }
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_none() && self.diameter.is_none()
    }
}

/// Beam, collimator and radiator configuration, and the reciprocal
/// lattice of the radiator crystal.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiatorModel {
    max_energy: f64,
    beam_energy: f64,
    beam_erms: f64,
    beam_emittance: f64,
    collimator_spotrms: f64,
    collimator_distance: f64,
    collimator_diameter: f64,
    target_thickness: f64,
    collimated: bool,
    polarized: bool,
    scattering: MultipleScattering,
    lattice_tolerance: f64,
    crystals: CrystalTable,
    species: CrystalSpecies,
    lattice: ReciprocalLattice,
    orientation: Orientation,
}

fn positive(name: &str, value: f64, unit: &str) -> Result<f64, RadiatorError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(RadiatorError::config(name, value, &format!("> 0 {}", unit)))
    }
}

fn non_negative(name: &str, value: f64, unit: &str) -> Result<f64, RadiatorError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(RadiatorError::config(name, value, &format!(">= 0 {}", unit)))
    }
}

impl RadiatorModel {
    /// Creates a diamond radiator for a beam of energy `max_energy`, in the
    /// standard orientation (see [`align_target`](Self::align_target)),
    /// tilted so that its primary coherent edge lies at photon energy
    /// `peak_energy` (both in GeV). Requires `max_energy > peak_energy > 0`.
    pub fn new(max_energy: f64, peak_energy: f64) -> Result<Self, RadiatorError> {
        Self::with_crystals(max_energy, peak_energy, CrystalTable::default(), "diamond")
    }

    /// As [`new`](Self::new), but with a user-supplied table of crystal
    /// species and the name of the one to start with.
    pub fn with_crystals(max_energy: f64, peak_energy: f64, crystals: CrystalTable, name: &str) -> Result<Self, RadiatorError> {
        let max_energy = positive("maximum beam energy", max_energy, "GeV")?;
        if !(peak_energy > 0.0 && peak_energy < max_energy) {
            return Err(RadiatorError::config("coherent edge", peak_energy, &format!("in (0, {}) GeV", max_energy)));
        }

        let species = crystals.get(name)?.clone();
        species.validate()?;
        let lattice = ReciprocalLattice::build(&species);

        let mut model = Self {
            max_energy,
            beam_energy: max_energy,
            beam_erms: 6.0e-4,
            beam_emittance: 2.5e-9,
            collimator_spotrms: 0.5e-3,
            collimator_distance: 76.0,
            collimator_diameter: 3.4e-3,
            target_thickness: 20.0e-6,
            collimated: true,
            polarized: false,
            scattering: MultipleScattering::default(),
            lattice_tolerance: SHELL_TOLERANCE,
            crystals,
            species,
            lattice,
            orientation: Orientation::identity(),
        };

        model.align_target();
        model.set_coherent_edge(peak_energy)?;
        Ok(model)
    }

    pub fn max_beam_energy(&self) -> f64 {
        self.max_energy
    }

    pub fn beam_energy(&self) -> f64 {
        self.beam_energy
    }

    /// RMS spread of the beam energy, GeV
    pub fn beam_erms(&self) -> f64 {
        self.beam_erms
    }

    /// Transverse beam emittance, m rad
    pub fn beam_emittance(&self) -> f64 {
        self.beam_emittance
    }

    /// RMS radius of the beam spot on the collimator, m
    pub fn collimator_spotrms(&self) -> f64 {
        self.collimator_spotrms
    }

    pub fn collimator_distance(&self) -> f64 {
        self.collimator_distance
    }

    pub fn collimator_diameter(&self) -> f64 {
        self.collimator_diameter
    }

    pub fn target_thickness(&self) -> f64 {
        self.target_thickness
    }

    pub fn collimated_flux(&self) -> bool {
        self.collimated
    }

    pub fn polarized_flux(&self) -> bool {
        self.polarized
    }

    pub fn target_crystal(&self) -> &CrystalSpecies {
        &self.species
    }

    pub fn target_crystal_name(&self) -> &str {
        &self.species.name
    }

    pub fn crystal_table(&self) -> &CrystalTable {
        &self.crystals
    }

    pub fn lattice(&self) -> &ReciprocalLattice {
        &self.lattice
    }

    pub fn scattering_model(&self) -> MultipleScattering {
        self.scattering
    }

    pub fn set_beam_energy(&mut self, energy: f64) -> Result<(), RadiatorError> {
        self.beam_energy = positive("beam energy", energy, "GeV")?;
        Ok(())
    }

    pub fn set_beam_erms(&mut self, erms: f64) -> Result<(), RadiatorError> {
        self.beam_erms = non_negative("beam energy spread", erms, "GeV")?;
        Ok(())
    }

    pub fn set_beam_emittance(&mut self, emittance: f64) -> Result<(), RadiatorError> {
        self.beam_emittance = non_negative("beam emittance", emittance, "m rad")?;
        Ok(())
    }

    pub fn set_collimator_spotrms(&mut self, spotrms: f64) -> Result<(), RadiatorError> {
        self.collimator_spotrms = non_negative("collimator spot size", spotrms, "m")?;
        Ok(())
    }

    pub fn set_collimator_distance(&mut self, distance: f64) -> Result<(), RadiatorError> {
        self.collimator_distance = positive("collimator distance", distance, "m")?;
        Ok(())
    }

    pub fn set_collimator_diameter(&mut self, diameter: f64) -> Result<(), RadiatorError> {
        self.collimator_diameter = positive("collimator diameter", diameter, "m")?;
        Ok(())
    }

    pub fn set_target_thickness(&mut self, thickness: f64) -> Result<(), RadiatorError> {
        self.target_thickness = positive("target thickness", thickness, "m")?;
        Ok(())
    }

    pub fn set_collimated_flux(&mut self, collimated: bool) {
        self.collimated = collimated;
    }

    pub fn set_polarized_flux(&mut self, polarized: bool) {
        self.polarized = polarized;
    }

    pub fn set_scattering_model(&mut self, model: MultipleScattering) {
        self.scattering = model;
    }

    /// Largest fraction of the coherent rate that either of the two
    /// outermost lattice shells may contribute before a rate query
    /// reports a convergence error.
    pub fn lattice_tolerance(&self) -> f64 {
        self.lattice_tolerance
    }

    pub fn set_lattice_tolerance(&mut self, tolerance: f64) -> Result<(), RadiatorError> {
        self.lattice_tolerance = positive("lattice sum tolerance", tolerance, "")?;
        Ok(())
    }

    /// Switches to the named crystal, rebuilding the reciprocal lattice.
    /// The orientation angles are kept, so the coherent edge generally moves.
    pub fn set_target_crystal(&mut self, name: &str) -> Result<(), RadiatorError> {
        let species = self.crystals.get(name)?.clone();
        self.lattice = ReciprocalLattice::build(&species);
        self.species = species;
        Ok(())
    }

    /// Makes a new crystal species available to `set_target_crystal`.
    pub fn register_crystal(&mut self, species: CrystalSpecies) -> Result<(), RadiatorError> {
        self.crystals.register(species)
    }

    /// Sets the Debye temperature and the temperature (K) of the current
    /// crystal, which fix its Debye-Waller constant.
    pub fn set_target_temperature(&mut self, debye_temperature: f64, temperature: f64) -> Result<(), RadiatorError> {
        positive("Debye temperature", debye_temperature, "K")?;
        non_negative("temperature", temperature, "K")?;
        let species = self.species.clone().with_temperature(debye_temperature, temperature);
        species.validate()?;
        self.lattice = ReciprocalLattice::build(&species);
        self.species = species;
        Ok(())
    }

    /// Radiation length of the current crystal (m), PDG fit.
    pub fn radiation_length_pdg(&self) -> f64 {
        self.species.radiation_length_pdg()
    }

    /// Radiation length of the current crystal (m), Schiff's formula.
    pub fn radiation_length_schiff(&self) -> f64 {
        self.species.radiation_length_schiff()
    }

    /// Debye-Waller constant (GeV^-2) of the current crystal's atoms, for
    /// the given Debye temperature and temperature (K).
    pub fn debye_waller_constant(&self, debye_temperature: f64, temperature: f64) -> Result<f64, RadiatorError> {
        positive("Debye temperature", debye_temperature, "K")?;
        non_negative("temperature", temperature, "K")?;
        Ok(crate::crystal::debye_waller_constant(self.species.atomic_mass, debye_temperature, temperature))
    }

    fn scattering_target(&self, thickness: f64) -> ScatteringTarget {
        ScatteringTarget::new(&self.species, thickness, self.beam_energy)
    }

    /// Mean-square multiple-scattering angle (rad^2, projected onto a plane)
    /// of the beam after `thickness` m of the current crystal, using the
    /// selected model (Geant, unless changed).
    pub fn sigma2_ms(&self, thickness: f64) -> Result<f64, RadiatorError> {
        self.scattering.theta0_sqr(&self.scattering_target(thickness))
    }

    pub fn sigma2_ms_kaune(&self, thickness: f64) -> Result<f64, RadiatorError> {
        Kaune.theta0_sqr(&self.scattering_target(thickness))
    }

    pub fn sigma2_ms_pdg(&self, thickness: f64) -> Result<f64, RadiatorError> {
        Pdg.theta0_sqr(&self.scattering_target(thickness))
    }

    pub fn sigma2_ms_geant(&self, thickness: f64) -> Result<f64, RadiatorError> {
        Geant.theta0_sqr(&self.scattering_target(thickness))
    }

    pub fn sigma2_ms_hanson(&self, thickness: f64) -> Result<f64, RadiatorError> {
        Hanson.theta0_sqr(&self.scattering_target(thickness))
    }

    /// Summary of the beam and collimator configuration.
    pub fn beamline_info(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "beam energy          = {:.4} GeV (max {:.4} GeV)", self.beam_energy, self.max_energy);
        let _ = writeln!(s, "beam energy spread   = {:.3e} GeV", self.beam_erms);
        let _ = writeln!(s, "beam emittance       = {:.3e} m rad", self.beam_emittance);
        let _ = writeln!(s, "spot size on coll.   = {:.3e} m", self.collimator_spotrms);
        let _ = writeln!(s, "collimator distance  = {:.3} m", self.collimator_distance);
        let _ = writeln!(s, "collimator diameter  = {:.3e} m", self.collimator_diameter);
        let _ = writeln!(s, "collimated flux      = {}", self.collimated);
        let _ = writeln!(s, "polarized flux       = {}", self.polarized);
        let _ = write!(s, "multiple scattering  = {}", self.scattering.name());
        s
    }

    /// Summary of the radiator crystal and its orientation.
    pub fn target_crystal_info(&self) -> String {
        let c = &self.species;
        let [h, k, l] = c.primary_hkl;
        let mut s = String::new();
        let _ = writeln!(s, "crystal              = {} (Z = {}, A = {} g/mol)", c.name, c.z, c.atomic_mass);
        let _ = writeln!(s, "density              = {} g/cm^3", c.density);
        let _ = writeln!(s, "lattice constant     = {:.4e} m, {} sites per cell", c.lattice_constant, c.nsites());
        let _ = writeln!(s, "radiation length     = {:.4} m", c.radiation_length);
        let _ = writeln!(s, "debye-waller const.  = {:.4e} GeV^-2 (T = {} K, Debye T = {} K)", c.debye_waller_constant, c.temperature, c.debye_temperature);
        let _ = writeln!(s, "mosaic spread        = {:.3e} rad", c.mosaic_spread);
        let _ = writeln!(s, "thickness            = {:.3e} m", self.target_thickness);
        let _ = writeln!(s, "orientation          = ({:.6e}, {:.6e}, {:.6e}) rad", self.orientation.thetax(), self.orientation.thetay(), self.orientation.thetaz());
        match self.coherent_edge() {
            Ok(edge) => { let _ = write!(s, "primary ({}{}{}) edge   = {:.4} GeV", h, k, l, edge); },
            Err(_) => { let _ = write!(s, "primary ({}{}{}) edge   = none", h, k, l); },
        }
        s
    }

    pub fn print_beamline_info(&self) {
        println!("{}", "Beamline:".bold().cyan());
        for line in self.beamline_info().lines() {
            println!("\t{}", line);
        }
    }

    pub fn print_target_crystal_info(&self) {
        println!("{}", "Radiator:".bold().cyan());
        for line in self.target_crystal_info().lines() {
            println!("\t{}", line);
        }
    }

    /// Minimum longitudinal momentum transfer, units of the electron mass
    fn delta(&self, x: f64) -> f64 {
        ELECTRON_MASS * x / (2.0 * self.beam_energy * (1.0 - x))
    }

    /// Lorentz factor of the beam
    fn gamma(&self) -> f64 {
        self.beam_energy / ELECTRON_MASS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        assert_eq!(model.beam_energy(), 12.0);
        assert_eq!(model.target_crystal_name(), "diamond");
        assert!(model.collimated_flux() && !model.polarized_flux());

        assert!(RadiatorModel::new(12.0, 12.0).is_err());
        assert!(RadiatorModel::new(12.0, 0.0).is_err());
        assert!(RadiatorModel::new(9.0, 12.0).is_err());
        assert!(RadiatorModel::new(-1.0, -2.0).is_err());
    }

    #[test]
    fn setters_validate() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        assert!(model.set_target_thickness(0.0).is_err());
        assert!(model.set_collimator_distance(-76.0).is_err());
        assert!(model.set_collimator_diameter(f64::NAN).is_err());
        assert!(model.set_beam_emittance(-1.0e-9).is_err());
        assert!(model.set_target_crystal("kryptonite").is_err());
        // failed setters leave the model untouched
        assert_eq!(model, RadiatorModel::new(12.0, 9.0).unwrap());

        model.set_target_thickness(50.0e-6).unwrap();
        model.set_beam_erms(0.0).unwrap();
        assert_eq!(model.target_thickness(), 50.0e-6);
        assert_eq!(model.beam_erms(), 0.0);
    }

    #[test]
    fn crystal_switching() {
        let mut model = RadiatorModel::new(12.0, 9.0).unwrap();
        model.set_target_crystal("silicon").unwrap();
        assert_eq!(model.target_crystal().z, 14.0);
        println!("{}", model.target_crystal_info());
        assert!((model.radiation_length_pdg() - 0.0948).abs() < 1.0e-3);

        model.set_target_crystal("diamond").unwrap();
        let cold = model.debye_waller_constant(2200.0, 10.0).unwrap();
        model.set_target_temperature(2200.0, 10.0).unwrap();
        assert_eq!(model.target_crystal().debye_waller_constant, cold);
        assert!(model.set_target_temperature(0.0, 10.0).is_err());
    }

    #[test]
    fn scattering_models() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        let t = model.target_thickness();
        let default = model.sigma2_ms(t).unwrap();
        assert_eq!(default, model.sigma2_ms_geant(t).unwrap());

        let x0 = model.radiation_length_pdg();
        for thickness in [1.0e-3 * x0, 1.0e-2 * x0, 0.1 * x0].iter() {
            let pdg = model.sigma2_ms_pdg(*thickness).unwrap();
            let hanson = model.sigma2_ms_hanson(*thickness).unwrap();
            let kaune = model.sigma2_ms_kaune(*thickness).unwrap();
            println!("{:.3e} m: {:.3e} (PDG), {:.3e} (Hanson), {:.3e} (Kaune)", thickness, pdg.sqrt(), hanson.sqrt(), kaune.sqrt());
            assert!(((hanson / pdg).sqrt() - 1.0).abs() < 0.2);
        }
    }

    #[test]
    fn reports() {
        let model = RadiatorModel::new(12.0, 9.0).unwrap();
        model.print_beamline_info();
        model.print_target_crystal_info();
        assert!(model.beamline_info().contains("collimator distance"));
        assert!(model.target_crystal_info().contains("diamond"));
    }
}
