//! Construction of a radiator model from the `beam`, `collimator`,
//! `radiator`, `flux` and `crystals` sections of a configuration,
//! and of the spectrum settings in `output`.

use crate::crystal::{CrystalSpecies, CrystalTable, unit_cell};
use crate::error::RadiatorError;
use crate::radiator::RadiatorModel;
use crate::scattering::MultipleScattering;
use super::{Config, InputError, InputErrorKind};

/// What the driver should tabulate, and where.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSettings {
    pub xmin: f64,
    pub xmax: f64,
    pub points: usize,
    /// Smear the spectrum by the beam divergence
    pub convolve: bool,
    /// Directory for output files, if not the working directory
    pub directory: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            xmin: 0.02,
            xmax: 0.98,
            points: 193,
            convolve: true,
            directory: None,
        }
    }
}

/// Reads an optional number at `path` and, if present, passes it to `set`.
fn apply<F>(config: &Config, path: &str, set: F) -> Result<(), InputError>
where F: FnOnce(f64) -> Result<(), RadiatorError> {
    if let Some(value) = config.read_optional::<f64, _>(path)? {
        set(value).map_err(|e| InputError::invalid(path, e))?;
    }
    Ok(())
}

/// Reads the species defined under `crystals:name`.
///
/// Requires `z`, `mass` (g/mol), `density` (g/cm^3), `lattice_constant` (m)
/// and `debye_temperature` (K), and either `cell`, the name of a cubic unit
/// cell, or `sites`, a list of fractional coordinates. Optional are `primary`
/// (default `[2, 2, 0]`), `temperature` (default 300 K) and `mosaic_spread` (rad).
pub fn read_crystal(config: &Config, name: &str) -> Result<CrystalSpecies, InputError> {
    let path = |key: &str| format!("crystals:{}:{}", name, key);

    let z: f64 = config.read(path("z"))?;
    let mass: f64 = config.read(path("mass"))?;
    let density: f64 = config.read(path("density"))?;
    let lattice_constant: f64 = config.read(path("lattice_constant"))?;
    let debye_temperature: f64 = config.read(path("debye_temperature"))?;
    let temperature: f64 = config.read_optional(path("temperature"))?.unwrap_or(300.0);
    let mosaic_spread: f64 = config.read_optional(path("mosaic_spread"))?.unwrap_or(0.0);
    let primary: [i32; 3] = config.read_optional(path("primary"))?.unwrap_or([2, 2, 0]);

    let sites = match config.read_optional::<String, _>(path("cell"))? {
        Some(cell) => unit_cell(&cell).map_err(|e| InputError::invalid(&path("cell"), e))?,
        None => config.read(path("sites"))?,
    };

    if !(debye_temperature > 0.0 && temperature >= 0.0) {
        let e = RadiatorError::config("temperatures", format!("{} K, {} K", debye_temperature, temperature), "> 0 and >= 0");
        return Err(InputError::invalid(&path("temperature"), e));
    }

    let species = CrystalSpecies::cubic(name, z, mass, density, lattice_constant, sites, primary)
        .with_mosaic_spread(mosaic_spread)
        .with_temperature(debye_temperature, temperature);

    species.validate()
        .map_err(|e| InputError::invalid(&format!("crystals:{}", name), e))?;

    Ok(species)
}

/// The coherent edge energies (GeV) requested by `radiator:edge`,
/// which may be a single value or a start/stop/step loop.
pub fn coherent_edges(config: &Config) -> Result<Vec<f64>, InputError> {
    let edges: Vec<f64> = config.read_loop("radiator:edge")?;
    if edges.is_empty() {
        return Err(InputError::conversion("radiator:edge", "edge"));
    }
    Ok(edges)
}

/// Builds the radiator described by the configuration, with its coherent
/// edge at the first of the requested energies.
pub fn build_radiator(config: &Config) -> Result<RadiatorModel, InputError> {
    let energy: f64 = config.read("beam:energy")?;
    let edge = coherent_edges(config)?[0];

    let names = match config.keys("crystals") {
        Ok(names) => names,
        Err(e) if e.kind() == InputErrorKind::Location => vec![],
        Err(e) => return Err(e),
    };

    let mut crystals = CrystalTable::default();
    for name in names.iter() {
        let species = read_crystal(config, name)?;
        crystals.register(species)
            .map_err(|e| InputError::invalid(&format!("crystals:{}", name), e))?;
    }

    let name = config.read_optional::<String, _>("radiator:crystal")?
        .unwrap_or_else(|| "diamond".to_owned());
    crystals.get(&name).map_err(|e| InputError::invalid("radiator:crystal", e))?;

    let mut model = RadiatorModel::with_crystals(energy, edge, crystals, &name)
        .map_err(|e| InputError::invalid("radiator:edge", e))?;

    apply(config, "beam:erms", |v| model.set_beam_erms(v))?;
    apply(config, "beam:emittance", |v| model.set_beam_emittance(v))?;
    apply(config, "collimator:spotrms", |v| model.set_collimator_spotrms(v))?;
    apply(config, "collimator:distance", |v| model.set_collimator_distance(v))?;
    apply(config, "collimator:diameter", |v| model.set_collimator_diameter(v))?;
    apply(config, "radiator:thickness", |v| model.set_target_thickness(v))?;
    apply(config, "radiator:tolerance", |v| model.set_lattice_tolerance(v))?;

    if let Some(temperature) = config.read_optional::<f64, _>("radiator:temperature")? {
        let debye_temperature = config.read_optional("radiator:debye_temperature")?
            .unwrap_or(model.target_crystal().debye_temperature);
        model.set_target_temperature(debye_temperature, temperature)
            .map_err(|e| InputError::invalid("radiator:temperature", e))?;
    }

    if let Some(scattering) = config.read_optional::<String, _>("radiator:scattering")? {
        let scattering: MultipleScattering = scattering.parse()
            .map_err(|e| InputError::invalid("radiator:scattering", e))?;
        model.set_scattering_model(scattering);
    }

    // a non-standard orientation moves the edge, so it is solved again
    let thetay = config.read_optional::<f64, _>("radiator:thetay")?;
    let thetaz = config.read_optional::<f64, _>("radiator:thetaz")?;
    if thetay.is_some() || thetaz.is_some() {
        if let Some(thetay) = thetay {
            model.set_target_thetay(thetay);
        }
        if let Some(thetaz) = thetaz {
            model.set_target_thetaz(thetaz);
        }
        model.set_coherent_edge(edge)
            .map_err(|e| InputError::invalid("radiator:edge", e))?;
    }

    if let Some(collimated) = config.read_optional("flux:collimated")? {
        model.set_collimated_flux(collimated);
    }

    if let Some(polarized) = config.read_optional("flux:polarized")? {
        model.set_polarized_flux(polarized);
    }

    Ok(model)
}

/// Reads the `output` section, falling back to the defaults for
/// anything absent.
pub fn read_output(config: &Config) -> Result<OutputSettings, InputError> {
    let default = OutputSettings::default();
    let settings = OutputSettings {
        xmin: config.read_optional("output:xmin")?.unwrap_or(default.xmin),
        xmax: config.read_optional("output:xmax")?.unwrap_or(default.xmax),
        points: config.read_optional("output:points")?.unwrap_or(default.points),
        convolve: config.read_optional("output:convolve")?.unwrap_or(default.convolve),
        directory: config.read_optional("output:directory")?,
    };

    if !(settings.xmin > 0.0 && settings.xmin < settings.xmax && settings.xmax < 1.0) {
        let e = RadiatorError::config("x range", format!("[{}, {}]", settings.xmin, settings.xmax), "0 < xmin < xmax < 1");
        return Err(InputError::invalid("output:xmin", e));
    }

    if settings.points < 3 {
        let e = RadiatorError::config("number of points", settings.points, ">= 3");
        return Err(InputError::invalid("output:points", e));
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1.0e-12 * b.abs()
    }

    const TEXT: &str = "---
    constants:
      t: 50 * micro

    beam:
      energy: 12.0 * GeV
      erms: 3 * MeV
      emittance: 5 * nano

    collimator:
      spotrms: 0.6 * milli
      distance: 70
      diameter: 5.0 * milli

    radiator:
      crystal: germanium
      thickness: t
      edge:
        start: 8.0
        stop: 9.0
        step: 0.5
      temperature: 100
      scattering: pdg

    flux:
      collimated: false

    crystals:
      germanium:
        z: 32
        mass: 72.63
        density: 5.323
        lattice_constant: 5.658e-10
        debye_temperature: 374
        cell: diamond
      iron:
        z: 26
        mass: 55.845
        density: 7.874
        lattice_constant: 2.8665e-10
        debye_temperature: 470
        sites: [[0, 0, 0], [0.5, 0.5, 0.5]]
        primary: [1, 1, 0]

    output:
      xmin: 0.5
      points: 91
    ";

    fn config(text: &str) -> Config {
        let mut config = Config::from_string(text).unwrap();
        config.with_context("constants").unwrap();
        config
    }

    #[test]
    fn full_configuration() {
        let config = config(TEXT);
        let model = build_radiator(&config).unwrap();

        assert_eq!(model.beam_energy(), 12.0);
        assert!(close(model.beam_erms(), 3.0e-3));
        assert!(close(model.beam_emittance(), 5.0e-9));
        assert!(close(model.collimator_spotrms(), 0.6e-3));
        assert_eq!(model.collimator_distance(), 70.0);
        assert!(close(model.collimator_diameter(), 5.0e-3));
        assert!(close(model.target_thickness(), 50.0e-6));
        assert_eq!(model.target_crystal_name(), "germanium");
        assert_eq!(model.target_crystal().temperature, 100.0);
        assert_eq!(model.target_crystal().debye_temperature, 374.0);
        assert_eq!(model.scattering_model(), "pdg".parse::<MultipleScattering>().unwrap());
        assert!(!model.collimated_flux());
        assert!(!model.polarized_flux());

        let edge = model.coherent_edge().unwrap();
        println!("edge at {:.6} GeV", edge);
        assert!((edge - 8.0).abs() < 1.0e-6);
        assert_eq!(coherent_edges(&config).unwrap(), vec![8.0, 8.5, 9.0]);

        assert!(model.crystal_table().names().contains(&"iron"));
        assert!(model.crystal_table().names().contains(&"silicon"));

        let output = read_output(&config).unwrap();
        assert_eq!(output.xmin, 0.5);
        assert_eq!(output.xmax, OutputSettings::default().xmax);
        assert_eq!(output.points, 91);
        assert!(output.directory.is_none());
    }

    #[test]
    fn defaults() {
        let config = config("---
        beam:
          energy: 12.0
        radiator:
          edge: 9.0
        ");
        let model = build_radiator(&config).unwrap();
        assert_eq!(model, RadiatorModel::new(12.0, 9.0).unwrap());
        assert_eq!(read_output(&config).unwrap(), OutputSettings::default());
    }

    #[test]
    fn orientation() {
        let config = config("---
        beam:
          energy: 12.0
        radiator:
          edge: 9.0
          thetaz: 0.3
          thetay: 10 * mrad
        ");
        let model = build_radiator(&config).unwrap();
        assert_eq!(model.target_orientation().thetaz(), 0.3);
        assert!(close(model.target_orientation().thetay(), 0.01));
        assert!((model.coherent_edge().unwrap() - 9.0).abs() < 1.0e-6);
    }

    #[test]
    fn rejected_values() {
        let missing = config("---
        radiator:
          edge: 9.0
        ");
        assert_eq!(build_radiator(&missing).unwrap_err().kind(), InputErrorKind::Location);

        let cases = [
            "---\nbeam:\n  energy: 12.0\nradiator:\n  edge: 13.0\n",
            "---\nbeam:\n  energy: 12.0\nradiator:\n  edge: 9.0\n  crystal: unobtainium\n",
            "---\nbeam:\n  energy: 12.0\nradiator:\n  edge: 9.0\n  thickness: -1.0\n",
            "---\nbeam:\n  energy: 12.0\nradiator:\n  edge: 9.0\n  scattering: rutherford\n",
            "---\nbeam:\n  energy: 12.0\nradiator:\n  edge: 9.0\ncrystals:\n  lead:\n    z: 82\n    mass: 207.2\n    density: 11.35\n    lattice_constant: 4.95e-10\n    debye_temperature: 105\n    cell: hcp\n",
            "---\nbeam:\n  energy: 12.0\nradiator:\n  edge: 9.0\noutput:\n  xmin: 0.9\n  xmax: 0.8\n",
        ];

        for text in cases.iter() {
            let config = config(text);
            let result = build_radiator(&config).and_then(|_| read_output(&config));
            let err = result.unwrap_err();
            println!("{}", err);
            assert_eq!(err.kind(), InputErrorKind::Invalid);
        }

        let malformed = config("---\nbeam:\n  energy: twelve\nradiator:\n  edge: 9.0\n");
        assert_eq!(build_radiator(&malformed).unwrap_err().kind(), InputErrorKind::Conversion);
    }
}
