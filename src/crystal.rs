//! Crystal species: the material constants and unit-cell geometry
//! that define a radiator's reciprocal lattice.

use std::collections::BTreeMap;
use std::f64::consts;
use num_complex::Complex64;

use crate::constants::*;
use crate::error::RadiatorError;
use crate::special_functions::debye_phi;

/// Physical description of a cubic crystal.
///
/// Units: lattice constant and radiation length in m, density in g/cm^3,
/// atomic mass in g/mol, Debye-Waller constant in GeV^-2, mosaic spread
/// in rad, temperatures in K. The form-factor parameter is the screening
/// radius in units of the reduced Compton wavelength.
#[derive(Clone, Debug, PartialEq)]
pub struct CrystalSpecies {
    pub name: String,
    pub z: f64,
    pub atomic_mass: f64,
    pub density: f64,
    pub lattice_constant: f64,
    pub radiation_length: f64,
    pub debye_waller_constant: f64,
    pub mosaic_spread: f64,
    pub form_factor_beta: f64,
    pub debye_temperature: f64,
    pub temperature: f64,
    pub sites: Vec<[f64; 3]>,
    pub primary_hkl: [i32; 3],
}

/// Unit cell of the diamond lattice: fcc with a two-atom basis.
const DIAMOND_SITES: [[f64; 3]; 8] = [
    [0.00, 0.00, 0.00],
    [0.00, 0.50, 0.50],
    [0.50, 0.00, 0.50],
    [0.50, 0.50, 0.00],
    [0.25, 0.25, 0.25],
    [0.25, 0.75, 0.75],
    [0.75, 0.25, 0.75],
    [0.75, 0.75, 0.25],
];

/// Fractional coordinates of the sites in a cubic unit cell, by the name
/// of the lattice: `diamond`, `fcc`, `bcc` or `sc`.
pub fn unit_cell(lattice: &str) -> Result<Vec<[f64; 3]>, RadiatorError> {
    match lattice.to_lowercase().as_str() {
        "diamond" => Ok(DIAMOND_SITES.to_vec()),
        "fcc" => Ok(DIAMOND_SITES[..4].to_vec()),
        "bcc" => Ok(vec![[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]]),
        "sc" => Ok(vec![[0.0, 0.0, 0.0]]),
        _ => Err(RadiatorError::config("unit cell", lattice, "one of 'diamond', 'fcc', 'bcc', 'sc'")),
    }
}

impl CrystalSpecies {
    /// Creates a cubic species from its elemental constants, deriving the
    /// radiation length (PDG fit), the screening parameter and the
    /// Debye-Waller constant at the given temperature.
    pub fn cubic(name: &str, z: f64, atomic_mass: f64, density: f64, lattice_constant: f64, sites: Vec<[f64; 3]>, primary_hkl: [i32; 3]) -> Self {
        let mut species = Self {
            name: name.to_owned(),
            z,
            atomic_mass,
            density,
            lattice_constant,
            radiation_length: 0.0,
            debye_waller_constant: 0.0,
            mosaic_spread: 0.0,
            form_factor_beta: 111.0 * z.powf(-1.0 / 3.0),
            debye_temperature: 0.0,
            temperature: 0.0,
            sites,
            primary_hkl,
        };
        species.radiation_length = species.radiation_length_pdg();
        species
    }

    pub fn with_mosaic_spread(self, mosaic_spread: f64) -> Self {
        Self { mosaic_spread, ..self }
    }

    /// Sets the lattice temperature, and the Debye temperature that
    /// characterises its phonon spectrum, recomputing the Debye-Waller
    /// constant.
    pub fn with_temperature(self, debye_temperature: f64, temperature: f64) -> Self {
        let debye_waller_constant = debye_waller_constant(self.atomic_mass, debye_temperature, temperature);
        Self { debye_temperature, temperature, debye_waller_constant, ..self }
    }

    pub fn diamond() -> Self {
        Self::cubic("diamond", 6.0, 12.01, 3.534, 3.5668e-10, DIAMOND_SITES.to_vec(), [2, 2, 0])
            .with_mosaic_spread(20.0e-6)
            .with_temperature(2200.0, 300.0)
    }

    pub fn silicon() -> Self {
        Self::cubic("silicon", 14.0, 28.086, 2.329, 5.431e-10, DIAMOND_SITES.to_vec(), [2, 2, 0])
            .with_mosaic_spread(5.0e-6)
            .with_temperature(645.0, 300.0)
    }

    pub fn nsites(&self) -> usize {
        self.sites.len()
    }

    /// Checks that all lengths and masses are positive and that the
    /// unit cell is populated.
    pub fn validate(&self) -> Result<(), RadiatorError> {
        let positive = [
            ("z", self.z),
            ("atomic mass", self.atomic_mass),
            ("density", self.density),
            ("lattice constant", self.lattice_constant),
            ("radiation length", self.radiation_length),
            ("form factor beta", self.form_factor_beta),
        ];

        for (name, value) in positive.iter() {
            if !(*value > 0.0 && value.is_finite()) {
                return Err(RadiatorError::config(&format!("{} of {}", name, self.name), value, "> 0"));
            }
        }

        if !(self.debye_waller_constant >= 0.0) {
            return Err(RadiatorError::config("debye-waller constant", self.debye_waller_constant, ">= 0"));
        }

        if !(self.mosaic_spread >= 0.0) {
            return Err(RadiatorError::config("mosaic spread", self.mosaic_spread, ">= 0"));
        }

        if self.sites.is_empty() {
            return Err(RadiatorError::config("unit cell", 0, "at least one site"));
        }

        if self.primary_hkl == [0, 0, 0] {
            return Err(RadiatorError::config("primary reciprocal vector", "(0,0,0)", "non-zero hkl"));
        }

        if self.structure_factor(self.primary_hkl).norm_sqr() < 1.0e-6 {
            return Err(RadiatorError::config("primary reciprocal vector", format!("{:?}", self.primary_hkl), "an allowed reflection"));
        }

        Ok(())
    }

    /// Number density of atoms, per m^3
    pub fn number_density(&self) -> f64 {
        1.0e6 * self.density * AVOGADRO / self.atomic_mass
    }

    /// Spacing of the reciprocal lattice, 2 pi / a, in units of the electron mass
    pub fn reciprocal_spacing(&self) -> f64 {
        2.0 * consts::PI * COMPTON_LENGTH / self.lattice_constant
    }

    /// Debye-Waller constant in units of the electron mass^-2
    pub fn debye_waller_constant_me(&self) -> f64 {
        self.debye_waller_constant * ELECTRON_MASS * ELECTRON_MASS
    }

    /// Sum over the unit cell of exp(2 pi i h.r)
    pub fn structure_factor(&self, hkl: [i32; 3]) -> Complex64 {
        let [h, k, l] = hkl;
        self.sites.iter()
            .map(|r| {
                let phase = 2.0 * consts::PI * ((h as f64) * r[0] + (k as f64) * r[1] + (l as f64) * r[2]);
                Complex64::from_polar(1.0, phase)
            })
            .sum()
    }

    /// Radiation length in m, from the PDG fit to the Tsai tables.
    pub fn radiation_length_pdg(&self) -> f64 {
        let z = self.z;
        let x0 = 716.4 * self.atomic_mass / (z * (z + 1.0) * (287.0 / z.sqrt()).ln()); // g/cm^2
        1.0e-2 * x0 / self.density
    }

    /// Radiation length in m, from the complete-screening Bethe-Heitler
    /// cross section of Schiff.
    pub fn radiation_length_schiff(&self) -> f64 {
        let z = self.z;
        let r_e = CLASSICAL_ELECTRON_RADIUS;
        let inverse = 4.0 * ALPHA_FINE * r_e * r_e * self.number_density()
            * z * (z + 1.0) * (183.0 * z.powf(-1.0 / 3.0)).ln();
        1.0 / inverse
    }
}

/// Returns the Debye-Waller constant, the mean-square thermal displacement
/// of an atom along one axis, in GeV^-2, for atoms of mass `atomic_mass`
/// (g/mol) in a lattice with Debye temperature `debye_temperature` held at
/// temperature `temperature` (both in K). Zero-point motion is included,
/// so the result is finite at `temperature = 0`.
pub fn debye_waller_constant(atomic_mass: f64, debye_temperature: f64, temperature: f64) -> f64 {
    let mass = atomic_mass * ATOMIC_MASS_UNIT;
    let k_theta = BOLTZMANN * debye_temperature;
    let thermal = if temperature > 0.0 {
        let x = debye_temperature / temperature;
        debye_phi(x) / x
    } else {
        0.0
    };
    3.0 / (mass * k_theta) * (thermal + 0.25)
}

/// A lookup table of crystal species by name, pre-populated with
/// diamond and silicon.
#[derive(Clone, Debug, PartialEq)]
pub struct CrystalTable {
    species: BTreeMap<String, CrystalSpecies>,
}

impl Default for CrystalTable {
    fn default() -> Self {
        let mut species = BTreeMap::new();
        for s in [CrystalSpecies::diamond(), CrystalSpecies::silicon()].iter() {
            species.insert(s.name.clone(), s.clone());
        }
        Self { species }
    }
}

impl CrystalTable {
    pub fn empty() -> Self {
        Self { species: BTreeMap::new() }
    }

    /// Adds a species to the table, replacing any existing entry with
    /// the same name.
    pub fn register(&mut self, species: CrystalSpecies) -> Result<(), RadiatorError> {
        species.validate()?;
        self.species.insert(species.name.clone(), species);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&CrystalSpecies, RadiatorError> {
        self.species.get(name)
            .ok_or_else(|| RadiatorError::config("crystal", name, &format!("one of {:?}", self.names())))
    }

    pub fn names(&self) -> Vec<&str> {
        self.species.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cells() {
        assert_eq!(unit_cell("Diamond").unwrap().len(), 8);
        assert_eq!(unit_cell("fcc").unwrap().len(), 4);
        assert!(unit_cell("hcp").is_err());

        // (1,0,0) is forbidden in bcc, (1,1,0) is not
        let bcc = CrystalSpecies::cubic("iron", 26.0, 55.845, 7.874, 2.8665e-10, unit_cell("bcc").unwrap(), [1, 1, 0]);
        assert!(bcc.structure_factor([1, 0, 0]).norm() < 1.0e-12);
        assert!((bcc.structure_factor([1, 1, 0]).norm() - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn diamond_constants() {
        let diamond = CrystalSpecies::diamond();
        diamond.validate().unwrap();

        let x0 = diamond.radiation_length_pdg();
        let x0_schiff = diamond.radiation_length_schiff();
        println!("X0 = {:.4} m (PDG), {:.4} m (Schiff)", x0, x0_schiff);
        assert!((x0 - 0.1217).abs() < 1.0e-3);
        assert!((x0_schiff - 0.1257).abs() < 1.0e-3);

        let a = diamond.debye_waller_constant;
        println!("A = {:.4e} GeV^-2", a);
        assert!(a > 3.9e8 && a < 4.05e8);
    }

    #[test]
    fn structure_factors() {
        let diamond = CrystalSpecies::diamond();
        let s = |hkl| diamond.structure_factor(hkl).norm_sqr();
        // all even, h + k + l = 4n
        assert!((s([2, 2, 0]) - 64.0).abs() < 1.0e-9);
        assert!((s([4, 0, 0]) - 64.0).abs() < 1.0e-9);
        // all odd
        assert!((s([1, 1, 1]) - 32.0).abs() < 1.0e-9);
        // forbidden: all even, h + k + l = 4n + 2
        assert!(s([2, 0, 0]) < 1.0e-9);
        // forbidden: mixed parity
        assert!(s([1, 1, 0]) < 1.0e-9);
    }

    #[test]
    fn debye_waller_temperature_dependence() {
        let cold = debye_waller_constant(12.01, 2200.0, 0.0);
        let room = debye_waller_constant(12.01, 2200.0, 300.0);
        let hot = debye_waller_constant(12.01, 2200.0, 3000.0);
        println!("A(0 K) = {:.4e}, A(300 K) = {:.4e}, A(3000 K) = {:.4e}", cold, room, hot);
        assert!(cold < room && room < hot);
        // at high temperature, the displacement grows linearly with T
        let hotter = debye_waller_constant(12.01, 2200.0, 30000.0);
        assert!((hotter / hot - 10.0).abs() < 0.2);
    }

    #[test]
    fn table_lookup() {
        let mut table = CrystalTable::default();
        assert!(table.get("diamond").is_ok());
        assert!(table.get("silicon").is_ok());
        assert!(table.get("unobtainium").is_err());

        let germanium = CrystalSpecies::cubic("germanium", 32.0, 72.63, 5.323, 5.658e-10, DIAMOND_SITES.to_vec(), [2, 2, 0])
            .with_temperature(374.0, 300.0);
        table.register(germanium).unwrap();
        assert_eq!(table.names(), vec!["diamond", "germanium", "silicon"]);

        let mut broken = CrystalSpecies::diamond();
        broken.name = "broken".to_owned();
        broken.sites.clear();
        assert!(table.register(broken).is_err());
        assert!(table.get("broken").is_err());
    }
}
