//! CSV adapters for spline tables, star samples and model outputs.
//!
//! The core model only sees typed columns; this module resolves column names,
//! turns empty and NaN cells into missing values and writes results back out
//! in the layout downstream tools expect.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MagErrError;
use crate::photometry::{Band, LogUncertaintyGrid, PerBand, SplineRow, SplineTable};
use crate::synthetic::{ObservedSample, SimulatedPhotometry, SyntheticSample};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing column '{0}'")]
    MissingColumn(String),
    #[error("Cannot parse '{value}' as a number in column '{column}', row {row}")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Model(#[from] MagErrError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Column names used to locate each band's data in a CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandColumns {
    pub magnitude: PerBand<String>,
    pub n_obs: PerBand<String>,
    pub knots: PerBand<String>,
    pub coefficients: PerBand<String>,
}

impl Default for BandColumns {
    fn default() -> Self {
        let names = |g: &str, bp: &str, rp: &str| PerBand::new(g.into(), bp.into(), rp.into());
        Self {
            magnitude: names("Gmag", "G_BPmag", "G_RPmag"),
            n_obs: names("phot_g_n_obs", "phot_bp_n_obs", "phot_rp_n_obs"),
            knots: names("knots_G", "knots_BP", "knots_RP"),
            coefficients: names("coeff_G", "coeff_BP", "coeff_RP"),
        }
    }
}

/// Parse one cell; empty and NaN cells are missing
fn parse_cell(cell: &str, row: usize, column: &str) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| CatalogError::Parse {
        row,
        column: column.to_string(),
        value: cell.to_string(),
    })?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// In-memory numeric view of the selected CSV columns
struct Columns {
    names: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl Columns {
    /// Read `wanted` columns; names in `optional` may be absent and read as missing
    fn read<R: std::io::Read>(reader: R, wanted: &[&str], optional: &[&str]) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let indices = wanted
            .iter()
            .map(|&name| match headers.iter().position(|h| h == name) {
                Some(index) => Ok(Some(index)),
                None if optional.contains(&name) => Ok(None),
                None => Err(CatalogError::MissingColumn(name.to_string())),
            })
            .collect::<Result<Vec<Option<usize>>>>()?;

        let mut values = vec![Vec::new(); wanted.len()];
        let mut record = StringRecord::new();
        let mut row = 0;
        while csv_reader.read_record(&mut record)? {
            row += 1;
            for (col, index) in indices.iter().enumerate() {
                let cell = index.and_then(|i| record.get(i)).unwrap_or("");
                values[col].push(parse_cell(cell, row, wanted[col])?);
            }
        }

        Ok(Self {
            names: wanted.iter().map(|s| s.to_string()).collect(),
            values,
        })
    }

    fn get(&self, name: &str) -> &[Option<f64>] {
        self.names
            .iter()
            .position(|n| n == name)
            .map_or(&[][..], |i| self.values[i].as_slice())
    }

    /// Column as an array with missing values as NaN
    fn array(&self, name: &str) -> Array1<f64> {
        self.get(name)
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect()
    }
}

/// Read a reference spline table with per-band knot and coefficient columns
pub fn read_spline_table<R: std::io::Read>(
    reader: R,
    columns: &BandColumns,
) -> Result<SplineTable> {
    let wanted: Vec<&str> = Band::ALL
        .iter()
        .flat_map(|&b| [columns.knots[b].as_str(), columns.coefficients[b].as_str()])
        .collect();
    let data = Columns::read(reader, &wanted, &[])?;

    let rows = PerBand::from_fn(|band| {
        let knots = data.get(&columns.knots[band]);
        let coefficients = data.get(&columns.coefficients[band]);
        knots
            .iter()
            .zip(coefficients)
            .map(|(&knot, &coefficient)| SplineRow { knot, coefficient })
            .collect::<Vec<_>>()
    });

    debug!("Read spline table with {} rows per band", rows.g.len());
    Ok(SplineTable::new(rows))
}

/// Read an observed catalog. Observation-count columns are required,
/// magnitude columns are optional.
pub fn read_observed_sample<R: std::io::Read>(
    reader: R,
    columns: &BandColumns,
) -> Result<ObservedSample> {
    let magnitude: Vec<&str> = columns.magnitude.values().map(String::as_str).collect();
    let mut wanted: Vec<&str> = columns.n_obs.values().map(String::as_str).collect();
    wanted.extend(&magnitude);
    let data = Columns::read(reader, &wanted, &magnitude)?;

    let sample = ObservedSample::new(
        PerBand::from_fn(|band| data.array(&columns.magnitude[band])),
        PerBand::from_fn(|band| data.array(&columns.n_obs[band])),
    )?;
    info!("Read observed sample of {} stars", sample.len());
    Ok(sample)
}

/// Read noise-free magnitudes of a synthetic sample
pub fn read_synthetic_sample<R: std::io::Read>(
    reader: R,
    columns: &BandColumns,
) -> Result<SyntheticSample> {
    let wanted: Vec<&str> = columns.magnitude.values().map(String::as_str).collect();
    let data = Columns::read(reader, &wanted, &[])?;

    let magnitudes = PerBand::from_fn(|band| data.array(&columns.magnitude[band]));
    let sample = SyntheticSample::new(magnitudes)?;
    info!("Read synthetic sample of {} stars", sample.len());
    Ok(sample)
}

/// Write the synthetic sample with simulated columns appended.
///
/// For a magnitude column `col` the output carries `col`, then
/// `col_nobs_syn`, `col_err_syn` and `col_syn` for every band.
pub fn write_simulated<W: std::io::Write>(
    writer: W,
    sample: &SyntheticSample,
    simulated: &SimulatedPhotometry,
    columns: &BandColumns,
) -> Result<()> {
    if sample.len() != simulated.len() {
        return Err(MagErrError::invalid(format!(
            "sample has {} stars but simulation has {}",
            sample.len(),
            simulated.len()
        ))
        .into());
    }

    let mut header: Vec<String> = columns.magnitude.values().cloned().collect();
    for suffix in ["nobs_syn", "err_syn", "syn"] {
        header.extend(columns.magnitude.values().map(|c| format!("{c}_{suffix}")));
    }

    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(&header)?;
    for i in 0..sample.len() {
        let mut row: Vec<String> = Band::ALL
            .iter()
            .map(|&b| sample.magnitudes(b)[i].to_string())
            .collect();
        row.extend(simulated.n_obs.values().map(|n| n[i].to_string()));
        row.extend(simulated.uncertainty.values().map(|u| u[i].to_string()));
        row.extend(simulated.magnitude.values().map(|m| m[i].to_string()));
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a log-uncertainty grid: the magnitude column then one `logU_{n}` column per count
pub fn write_grid<W: std::io::Write>(writer: W, grid: &LogUncertaintyGrid) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);

    let mut header = vec![grid.magnitude_label()];
    header.extend(grid.columns.iter().map(|c| c.label()));
    csv_writer.write_record(&header)?;

    for (i, mag) in grid.magnitudes.iter().enumerate() {
        let mut row = vec![mag.to_string()];
        row.extend(grid.columns.iter().map(|c| c.values[i].to_string()));
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn read_spline_table_path(path: &Path, columns: &BandColumns) -> Result<SplineTable> {
    read_spline_table(File::open(path)?, columns)
}

pub fn read_observed_sample_path(path: &Path, columns: &BandColumns) -> Result<ObservedSample> {
    read_observed_sample(File::open(path)?, columns)
}

pub fn read_synthetic_sample_path(path: &Path, columns: &BandColumns) -> Result<SyntheticSample> {
    read_synthetic_sample(File::open(path)?, columns)
}

pub fn write_simulated_path(
    path: &Path,
    sample: &SyntheticSample,
    simulated: &SimulatedPhotometry,
    columns: &BandColumns,
) -> Result<()> {
    write_simulated(File::create(path)?, sample, simulated, columns)
}

pub fn write_grid_path(path: &Path, grid: &LogUncertaintyGrid) -> Result<()> {
    write_grid(File::create(path)?, grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::UncertaintyModel;
    use crate::testing::{edr3_like_table, EDR3_LIKE_COEFFS, EDR3_LIKE_KNOTS};
    use ndarray::array;
    use tempfile::tempdir;

    fn spline_csv() -> String {
        let mut csv = String::from("knots_G,coeff_G,knots_BP,coeff_BP,knots_RP,coeff_RP\n");
        for (i, knot) in EDR3_LIKE_KNOTS.iter().enumerate() {
            let c = EDR3_LIKE_COEFFS.get(i).copied();
            let cell = |offset: f64| c.map_or("0".to_string(), |c| (c + offset).to_string());
            csv.push_str(&format!(
                "{knot},{},{knot},{},{knot},{}\n",
                cell(0.0),
                cell(0.2),
                cell(0.3)
            ));
        }
        // Padding rows, as in tables where bands have different lengths
        csv.push_str(",,,,,\n");
        csv.push_str("nan,NaN,,,,\n");
        csv
    }

    #[test]
    fn test_spline_table_missing_cells() {
        let table = read_spline_table(spline_csv().as_bytes(), &BandColumns::default()).unwrap();
        assert_eq!(table.rows.g.len(), EDR3_LIKE_KNOTS.len() + 2);
        assert_eq!(table.rows.bp[EDR3_LIKE_KNOTS.len()], SplineRow::default());

        let (knots, _) = table.valid_points(Band::G);
        assert_eq!(knots.len(), EDR3_LIKE_KNOTS.len());
        assert_eq!(
            table.valid_points(Band::Rp),
            edr3_like_table().valid_points(Band::Rp)
        );
    }

    #[test]
    fn test_spline_table_builds_model() {
        let table = read_spline_table(spline_csv().as_bytes(), &BandColumns::default()).unwrap();
        assert!(UncertaintyModel::gaia_edr3(&table).is_ok());
    }

    #[test]
    fn test_missing_column_reported() {
        let csv = "knots_G,coeff_G,knots_BP,coeff_BP,knots_RP\n4,1,4,1,4\n";
        let err = read_spline_table(csv.as_bytes(), &BandColumns::default()).unwrap_err();
        match err {
            CatalogError::MissingColumn(name) => assert_eq!(name, "coeff_RP"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_cell_reports_row_and_column() {
        let csv = "Gmag,G_BPmag,G_RPmag\n10.0,10.3,9.5\n11.0,abc,10.5\n";
        let err = read_synthetic_sample(csv.as_bytes(), &BandColumns::default()).unwrap_err();
        match err {
            CatalogError::Parse { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "G_BPmag");
                assert_eq!(value, "abc");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_observed_sample_without_magnitudes() {
        let csv = "source_id,phot_g_n_obs,phot_bp_n_obs,phot_rp_n_obs\n\
                   1,10,3,18\n2,20,,22\n3,30,2,20\n";
        let sample = read_observed_sample(csv.as_bytes(), &BandColumns::default()).unwrap();
        assert_eq!(sample.len(), 3);
        assert!(sample.n_obs(Band::Bp)[1].is_nan());
        assert!(sample.magnitudes(Band::G).iter().all(|m| m.is_nan()));
    }

    #[test]
    fn test_custom_column_names() {
        let mut columns = BandColumns::default();
        columns.magnitude = PerBand::new("g".into(), "bp".into(), "rp".into());
        let csv = "g,bp,rp\n12.0,12.4,11.5\n";
        let sample = read_synthetic_sample(csv.as_bytes(), &columns).unwrap();
        assert_eq!(sample.magnitudes(Band::Rp), &array![11.5]);
    }

    #[test]
    fn test_simulated_output_layout() {
        let magnitudes = PerBand::new(array![10.0], array![10.5], array![9.5]);
        let sample = SyntheticSample::new(magnitudes).unwrap();
        let simulated = SimulatedPhotometry {
            n_obs: PerBand::new(array![201], array![19], array![22]),
            uncertainty: PerBand::new(array![0.003], array![0.004], array![0.005]),
            magnitude: PerBand::new(array![10.001], array![10.502], array![9.499]),
        };

        let mut out = Vec::new();
        write_simulated(&mut out, &sample, &simulated, &BandColumns::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Gmag,G_BPmag,G_RPmag,Gmag_nobs_syn,G_BPmag_nobs_syn,G_RPmag_nobs_syn,\
             Gmag_err_syn,G_BPmag_err_syn,G_RPmag_err_syn,Gmag_syn,G_BPmag_syn,G_RPmag_syn"
        );
        assert_eq!(
            lines.next().unwrap(),
            "10,10.5,9.5,201,19,22,0.003,0.004,0.005,10.001,10.502,9.499"
        );
    }

    #[test]
    fn test_grid_written_to_file() {
        let model = UncertaintyModel::gaia_edr3(&edr3_like_table()).unwrap();
        let grid = model
            .evaluate(Band::Bp, &[0, 40], Some((8.0, 16.0)), 5)
            .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.csv");
        write_grid_path(&path, &grid).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "mag_bp,logU_20,logU_40");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("8,"));
        assert!(lines[5].starts_with("16,"));
    }

    #[test]
    fn test_path_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("LogErrVsMagSpline.csv");
        std::fs::write(&path, spline_csv()).unwrap();
        let table = read_spline_table_path(&path, &BandColumns::default()).unwrap();
        assert_eq!(
            table.valid_points(Band::G),
            edr3_like_table().valid_points(Band::G)
        );

        assert!(matches!(
            read_spline_table_path(&dir.path().join("absent.csv"), &BandColumns::default()),
            Err(CatalogError::Io(_))
        ));
    }
}
