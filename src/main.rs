use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use cobrems::{RadiatorError, RadiatorModel};
use cobrems::input::*;

/// One row of the spectrum table: x, then the total, coherent, incoherent
/// and electronic rates dN/dx, then the polarized coherent rate.
struct Row {
    x: f64,
    rates: [f64; 5],
}

/// Accepts the partial sum of a lattice sum that has not converged,
/// returning whether it had to.
fn best(result: Result<f64, RadiatorError>) -> Result<(f64, bool), RadiatorError> {
    match result {
        Ok(v) => Ok((v, false)),
        Err(e) => e.estimate().map(|v| (v, true)).ok_or(e),
    }
}

fn tabulate(model: &RadiatorModel, settings: &OutputSettings) -> Result<Vec<Row>, RadiatorError> {
    let mut unpolarized = model.clone();
    unpolarized.set_polarized_flux(false);
    let mut polarized = model.clone();
    polarized.set_polarized_flux(true);

    let n = settings.points;
    let dx = (settings.xmax - settings.xmin) / ((n - 1) as f64);
    let mut partial = 0;

    let mut rows = (0..n)
        .map(|i| -> Result<Row, RadiatorError> {
            let x = settings.xmin + dx * (i as f64);
            let (total, a) = best(unpolarized.rate_dntdx(x))?;
            let (coherent, b) = best(unpolarized.rate_dncdx(x))?;
            let (linear, c) = best(polarized.rate_dncdx(x))?;
            let nuclear = unpolarized.rate_dnidx(x)?;
            let electronic = unpolarized.rate_dnbidx(x)?;
            if a || b || c {
                partial += 1;
            }
            Ok(Row { x, rates: [total, coherent, nuclear, electronic, linear] })
        })
        .collect::<Result<Vec<Row>, _>>()?;

    if partial > 0 {
        eprintln!(
            "{}: lattice sums at {} of {} points did not reach a tolerance of {:.1e}, partial sums used.",
            "Warning".bold().yellow(), partial, n, model.lattice_tolerance(),
        );
    }

    if settings.convolve {
        let x: Vec<f64> = rows.iter().map(|r| r.x).collect();
        // the incoherent rates vary too slowly to be affected
        for j in [0, 1, 4].iter() {
            let mut y: Vec<f64> = rows.iter().map(|r| r.rates[*j]).collect();
            model.apply_beam_crystal_convolution(&x, &mut y)?;
            for (row, v) in rows.iter_mut().zip(y.iter()) {
                row.rates[*j] = *v;
            }
        }
    }

    Ok(rows)
}

fn write_spectrum(model: &RadiatorModel, rows: &[Row], path: &Path) -> Result<(), Box<dyn Error>> {
    let energy = model.beam_energy();
    let mut file = BufWriter::new(File::create(path)?);

    for line in model.beamline_info().lines().chain(model.target_crystal_info().lines()) {
        writeln!(file, "# {}", line)?;
    }
    writeln!(file, "# x k[GeV] dN/dx(total) dN/dx(coherent) dN/dx(incoherent) dN/dx(electronic) polarization")?;

    for row in rows {
        let [total, coherent, nuclear, electronic, linear] = row.rates;
        let pol = if total > 0.0 { linear / total } else { 0.0 };
        writeln!(
            file, "{:.6} {:.6e} {:.6e} {:.6e} {:.6e} {:.6e} {:.6}",
            row.x, row.x * energy, total, coherent, nuclear, electronic, pol,
        )?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1).ok_or(InputError::file())?;
    let path = PathBuf::from(path);

    let mut config = Config::from_file(&path)?;
    config.with_context("constants")?;

    let mut model = build_radiator(&config)?;
    let edges = coherent_edges(&config)?;
    let settings = read_output(&config)?;

    let directory = settings.directory.clone()
        .map(PathBuf::from)
        .or_else(|| path.parent().map(|p| p.to_path_buf()))
        .unwrap_or_default();
    std::fs::create_dir_all(&directory)?;

    println!("{} configuration from {}...", "Loaded".bold().cyan(), path.display().to_string().bold().blue());
    model.print_beamline_info();
    model.print_target_crystal_info();

    for edge in edges.iter() {
        if let Err(e) = model.set_coherent_edge(*edge) {
            eprintln!("{}: skipping edge at {} GeV: {}", "Error".bold().red(), edge, e);
            continue;
        }

        println!(
            "{} spectrum for edge at {:.3} GeV ({} points in x = [{}, {}])...",
            "Tabulating".bold().cyan(), edge, settings.points, settings.xmin, settings.xmax,
        );

        let rows = tabulate(&model, &settings)?;
        let filename = directory.join(format!("spectrum_{:.3}GeV.dat", edge));
        write_spectrum(&model, &rows, &filename)?;

        println!("{} {}.", "Wrote".bold().bright_green(), filename.display());
    }

    Ok(())
}
