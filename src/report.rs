//! CSV reports of a run's numeric output, the hand-off point for external plotting.
//!
//! Two reports are produced:
//! * `trajectory.csv` with columns `time,susceptible,infected,removed`
//! * `quantized.csv` with columns `time,signal,index,quantum`

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::log::info;
use crate::quantizer::Quantized;
use crate::trajectory::Trajectory;

pub const TRAJECTORY_REPORT: &str = "trajectory";
pub const QUANTIZED_REPORT: &str = "quantized";

/// One row of the quantized report.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct QuantizedRow {
    pub time: f64,
    pub signal: f64,
    pub index: usize,
    pub quantum: f64,
}

/// Where reports are written and how they are named.
#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub directory: PathBuf,
    /// Prepended to every report file name
    pub file_prefix: String,
    /// Replace report files that already exist
    pub overwrite: bool,
}

impl ReportOptions {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_prefix: String::new(),
            overwrite: true,
        }
    }

    #[must_use]
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Full path of the report called `short_name`.
    #[must_use]
    pub fn path_for(&self, short_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{short_name}.csv", self.file_prefix))
    }

    /// Writes the trajectory report and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_trajectory(&self, trajectory: &Trajectory) -> Result<PathBuf, SirError> {
        let path = self.path_for(TRAJECTORY_REPORT);
        write_rows(&path, self.overwrite, trajectory.points())?;
        Ok(path)
    }

    /// Writes the quantized report and returns its path.
    ///
    /// # Errors
    ///
    /// Returns `SirError::Config` if `times`, `signal`, and `quantized` differ in length, or an
    /// error if the file cannot be created or written.
    pub fn write_quantized(
        &self,
        times: &[f64],
        signal: &[f64],
        quantized: &Quantized,
    ) -> Result<PathBuf, SirError> {
        if times.len() != signal.len() || signal.len() != quantized.len() {
            return Err(SirError::Config(format!(
                "quantized report needs equal lengths, got {} times, {} samples, {} indices",
                times.len(),
                signal.len(),
                quantized.len()
            )));
        }
        let rows = times
            .iter()
            .zip(signal)
            .zip(quantized.indices.iter().zip(&quantized.quanta))
            .map(|((&time, &signal), (&index, &quantum))| QuantizedRow {
                time,
                signal,
                index,
                quantum,
            });
        let path = self.path_for(QUANTIZED_REPORT);
        write_rows(&path, self.overwrite, rows)?;
        Ok(path)
    }
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, SirError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            if !overwrite && path.exists() {
                return Err(SirError::Config(format!(
                    "report file {} already exists",
                    path.display()
                )));
            }
            Ok(File::create(path)?)
        }
        _ => Err(SirError::Config(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

fn write_rows<R, I>(path: &Path, overwrite: bool, rows: I) -> Result<(), SirError>
where
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let file = generate_validate_filepath(path, overwrite)?;
    let mut writer = Writer::from_writer(file);
    let mut count = 0_usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    info!("wrote {count} rows to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::integrate;
    use crate::model::{ModelParameters, StateVector};
    use crate::numeric::linspace;
    use crate::quantizer::quantize;
    use crate::trajectory::TrajectoryPoint;
    use tempfile::tempdir;

    #[derive(Deserialize)]
    struct TrajectoryRecord {
        time: f64,
        susceptible: f64,
        infected: f64,
        removed: f64,
    }

    fn small_trajectory() -> Trajectory {
        let grid = linspace(0.0, 10.0, 11).unwrap();
        integrate(
            &ModelParameters::default(),
            &StateVector::seeded(1000.0, 1.0, 0.0),
            &grid,
        )
        .unwrap()
    }

    #[test]
    fn writes_trajectory_report() {
        let temp_dir = tempdir().unwrap();
        let options = ReportOptions::new(temp_dir.path().join("nested"));
        let trajectory = small_trajectory();
        let path = options.write_trajectory(&trajectory).unwrap();
        assert_eq!(path, temp_dir.path().join("nested").join("trajectory.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["time", "susceptible", "infected", "removed"]
        );
        let records: Vec<TrajectoryRecord> =
            reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records.len(), 11);
        let expected: Vec<TrajectoryPoint> = trajectory.points().collect();
        for (record, point) in records.iter().zip(&expected) {
            assert_eq!(record.time, point.time);
            assert_eq!(record.susceptible, point.susceptible);
            assert_eq!(record.infected, point.infected);
            assert_eq!(record.removed, point.removed);
        }
    }

    #[test]
    fn writes_quantized_report_with_prefix() {
        let temp_dir = tempdir().unwrap();
        let options = ReportOptions::new(temp_dir.path()).file_prefix("run1_");
        let times = [0.0, 1.0, 2.0];
        let signal = [0.2, 0.5, 1.5];
        let quantized = quantize(&signal, &[0.5, 1.0], &[0.0, 1.0, 2.0]).unwrap();
        let path = options.write_quantized(&times, &signal, &quantized).unwrap();
        assert!(path.ends_with("run1_quantized.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<QuantizedRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(
            rows,
            vec![
                QuantizedRow { time: 0.0, signal: 0.2, index: 0, quantum: 0.0 },
                QuantizedRow { time: 1.0, signal: 0.5, index: 0, quantum: 0.0 },
                QuantizedRow { time: 2.0, signal: 1.5, index: 2, quantum: 2.0 },
            ]
        );
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let temp_dir = tempdir().unwrap();
        let options = ReportOptions::new(temp_dir.path());
        let quantized = quantize(&[0.1], &[], &[0.0]).unwrap();
        assert!(matches!(
            options.write_quantized(&[0.0, 1.0], &[0.1], &quantized),
            Err(SirError::Config(_))
        ));
    }

    #[test]
    fn refuses_to_overwrite_when_asked() {
        let temp_dir = tempdir().unwrap();
        let options = ReportOptions::new(temp_dir.path()).overwrite(false);
        let trajectory = small_trajectory();
        options.write_trajectory(&trajectory).unwrap();
        assert!(matches!(
            options.write_trajectory(&trajectory),
            Err(SirError::Config(_))
        ));
    }

    #[test]
    fn non_csv_path_rejected() {
        let temp_dir = tempdir().unwrap();
        let result = write_rows(
            &temp_dir.path().join("report.txt"),
            true,
            std::iter::empty::<QuantizedRow>(),
        );
        assert!(matches!(result, Err(SirError::Config(_))));
    }
}
