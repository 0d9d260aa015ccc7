//! Synthetic Gaia photometry tool
//!
//! Turns noise-free G/BP/RP magnitudes into simulated observations and
//! tabulates the log-uncertainty model.
//!
//! # Usage
//!
//! ```bash
//! # Simulate observations, calibrating the Poisson means on a real catalog
//! cargo run --release --bin syn_photometry -- simulate \
//!     --spline-table LogErrVsMagSpline.csv --synthetic isochrone.csv \
//!     --observed Melotte_22.csv --seed 42 --output Melotte_22_syn.csv
//!
//! # Same with explicit means and independent noise per band
//! cargo run --release --bin syn_photometry -- simulate \
//!     --spline-table LogErrVsMagSpline.csv --synthetic isochrone.csv \
//!     --poisson-means 200,20,20 --noise-mode independent --output out.csv
//!
//! # Log-uncertainty grid for BP at the reference count and at 40 observations
//! cargo run --release --bin syn_photometry -- grid \
//!     --spline-table LogErrVsMagSpline.csv --band bp --n-obs 0 --n-obs 40 --output bp.csv
//!
//! # Dump the default calibration for editing
//! cargo run --release --bin syn_photometry -- calibration --output edr3.json
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use magerr::io::{
    read_observed_sample_path, read_spline_table_path, read_synthetic_sample_path,
    write_grid_path, write_simulated_path, BandColumns,
};
use magerr::photometry::{Band, PerBand, SurveyCalibration, UncertaintyModel, DEFAULT_GRID_SAMPLES};
use magerr::synthetic::{NoiseCoupling, PhotometrySimulator};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate noisy photometry for a synthetic sample
    Simulate {
        /// Reference spline table (knots_*/coeff_* columns)
        #[arg(long)]
        spline_table: PathBuf,

        /// Synthetic sample with true magnitudes
        #[arg(long)]
        synthetic: PathBuf,

        /// Observed catalog used to derive median observation counts
        #[arg(
            long,
            conflicts_with = "poisson_means",
            required_unless_present = "poisson_means"
        )]
        observed: Option<PathBuf>,

        /// Poisson means for G, BP and RP observation counts
        #[arg(long, value_delimiter = ',')]
        poisson_means: Option<Vec<u32>>,

        /// Survey calibration JSON (defaults to Gaia EDR3)
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// How noise deviates are shared across bands
        #[arg(long, value_enum, default_value_t = NoiseCoupling::Shared)]
        noise_mode: NoiseCoupling,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Tabulate log10 uncertainty vs magnitude for one band
    Grid {
        /// Reference spline table (knots_*/coeff_* columns)
        #[arg(long)]
        spline_table: PathBuf,

        /// Band: g, bp or rp
        #[arg(long)]
        band: Band,

        /// Observation counts, 0 for the band's reference count
        #[arg(
            long = "n-obs",
            default_values_t = vec![0i64],
            allow_negative_numbers = true
        )]
        n_obs: Vec<i64>,

        /// Lower magnitude bound
        #[arg(long, requires = "mag_max")]
        mag_min: Option<f64>,

        /// Upper magnitude bound
        #[arg(long, requires = "mag_min")]
        mag_max: Option<f64>,

        /// Number of magnitude samples
        #[arg(long, default_value_t = DEFAULT_GRID_SAMPLES)]
        samples: usize,

        /// Survey calibration JSON (defaults to Gaia EDR3)
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the default survey calibration as JSON
    Calibration {
        /// Output JSON
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn load_calibration(path: Option<&PathBuf>) -> Result<SurveyCalibration, Box<dyn Error>> {
    match path {
        Some(path) => {
            info!("Loading calibration from {}", path.display());
            Ok(SurveyCalibration::load_from_file(path)?)
        }
        None => Ok(SurveyCalibration::gaia_edr3()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let columns = BandColumns::default();

    match cli.command {
        Commands::Simulate {
            spline_table,
            synthetic,
            observed,
            poisson_means,
            calibration,
            seed,
            noise_mode,
            output,
        } => {
            let table = read_spline_table_path(&spline_table, &columns)?;
            let model = UncertaintyModel::new(&table, load_calibration(calibration.as_ref())?)?;
            let sample = read_synthetic_sample_path(&synthetic, &columns)?;

            let simulator = match (observed, poisson_means) {
                (Some(path), _) => {
                    let observed = read_observed_sample_path(&path, &columns)?;
                    PhotometrySimulator::from_observed(&model, &observed, seed)?
                }
                (None, Some(means)) => {
                    let &[g, bp, rp] = means.as_slice() else {
                        return Err("--poisson-means needs exactly three values".into());
                    };
                    PhotometrySimulator::new(&model, PerBand::new(g, bp, rp), seed)
                }
                (None, None) => return Err("--observed or --poisson-means is required".into()),
            };
            let mut simulator = simulator.with_noise_coupling(noise_mode);

            let simulated = simulator.simulate(&sample)?;
            write_simulated_path(&output, &sample, &simulated, &columns)?;
            println!(
                "Wrote {} simulated stars to {}",
                simulated.len(),
                output.display()
            );
        }
        Commands::Grid {
            spline_table,
            band,
            n_obs,
            mag_min,
            mag_max,
            samples,
            calibration,
            output,
        } => {
            let table = read_spline_table_path(&spline_table, &columns)?;
            let model = UncertaintyModel::new(&table, load_calibration(calibration.as_ref())?)?;
            let range = mag_min.zip(mag_max);

            let grid = model.evaluate(band, &n_obs, range, samples)?;
            write_grid_path(&output, &grid)?;
            println!(
                "Wrote {} x {} grid for band {band} to {}",
                grid.magnitudes.len(),
                grid.columns.len(),
                output.display()
            );
        }
        Commands::Calibration { output } => {
            SurveyCalibration::gaia_edr3().save_to_file(&output)?;
            println!("Wrote default calibration to {}", output.display());
        }
    }

    Ok(())
}
