//! Experiment Log - per-epoch training record of one run on one dataset

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::ExperimentSummary;
use crate::config::Calibration;
use crate::{Error, Result};

/// Column holding cumulative wall-clock time.
pub const ELAPSED_TIME_COLUMN: usize = 1;

/// Column holding the epoch counter.
pub const EPOCH_COLUMN: usize = 2;

/// Column holding the accuracy-like metric.
pub const ACCURACY_COLUMN: usize = 5;

/// Minimum number of columns a usable log has.
pub const MIN_COLUMNS: usize = ACCURACY_COLUMN + 1;

/// Experiment Log holds one row per epoch as `Float64` Arrow columns.
///
/// Rows are never filtered: a NaN in a used column propagates into the
/// summary, the same way a single-row log still yields a summary.
#[derive(Debug, Clone)]
pub struct ExperimentLog {
    origin: String,
    batch: RecordBatch,
}

impl ExperimentLog {
    /// Build a log from numeric rows.
    ///
    /// `origin` names the file (or fixture) in error messages. Column names
    /// are taken from `headers` where available, `col_N` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLog`] if there are no rows, fewer than
    /// [`MIN_COLUMNS`] columns, or rows of differing width.
    pub fn from_rows(
        origin: impl Into<String>,
        headers: &[String],
        rows: &[Vec<f64>],
    ) -> Result<Self> {
        let origin = origin.into();
        let malformed = |reason: String| Error::MalformedLog {
            path: origin.clone(),
            reason,
        };

        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| malformed("no data rows after the header".to_string()))?;
        if width < MIN_COLUMNS {
            return Err(malformed(format!(
                "expected at least {MIN_COLUMNS} columns, found {width}"
            )));
        }
        if let Some((row, len)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != width)
        {
            return Err(malformed(format!(
                "data row {} has {len} columns, expected {width}",
                row + 1
            )));
        }

        let fields: Vec<Field> = (0..width)
            .map(|i| {
                let name = headers
                    .get(i)
                    .filter(|h| !h.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("col_{i}"));
                Field::new(name, DataType::Float64, false)
            })
            .collect();
        let columns: Vec<ArrayRef> = (0..width)
            .map(|i| {
                let values: Vec<f64> = rows.iter().map(|row| row[i]).collect();
                Arc::new(Float64Array::from(values)) as ArrayRef
            })
            .collect();

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self { origin, batch })
    }

    /// Parse a comma-delimited log with one header row.
    ///
    /// Empty fields read as NaN; any other non-numeric field is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLog`] on unreadable CSV, non-numeric fields or
    /// any of the shape problems listed in [`from_rows`](Self::from_rows).
    pub fn from_csv_reader<R: Read>(origin: impl Into<String>, reader: R) -> Result<Self> {
        let origin = origin.into();
        let malformed = |reason: String| Error::MalformedLog {
            path: origin.clone(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| malformed(format!("failed to read header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            let line = record.position().map_or(0, csv::Position::line);
            let row = record
                .iter()
                .enumerate()
                .map(|(column, field)| {
                    if field.is_empty() {
                        return Ok(f64::NAN);
                    }
                    field.parse::<f64>().map_err(|_| {
                        malformed(format!(
                            "line {line}, column {column}: '{field}' is not numeric"
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        Self::from_rows(origin, &headers, &rows)
    }

    /// Read and parse a log file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLog`] if the file cannot be opened or parsed.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|e| Error::MalformedLog {
            path: origin.clone(),
            reason: format!("failed to open: {e}"),
        })?;
        Self::from_csv_reader(origin, std::io::BufReader::new(file))
    }

    /// File path or fixture label the log came from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Number of epochs (rows).
    #[must_use]
    pub fn num_epochs(&self) -> usize {
        self.batch.num_rows()
    }

    /// Underlying Arrow batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    fn float_column(&self, index: usize) -> Result<&Float64Array> {
        self.batch
            .column(index)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::Other(format!("column {index} of {} is not Float64", self.origin)))
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(array: &Float64Array) -> f64 {
        let sum = arrow::compute::kernels::aggregate::sum(array).unwrap_or(f64::NAN);
        sum / array.len() as f64
    }

    /// Arithmetic mean of the accuracy column over all epochs.
    ///
    /// # Errors
    ///
    /// Returns error if the accuracy column is not numeric.
    pub fn accuracy(&self) -> Result<f64> {
        Ok(Self::mean(self.float_column(ACCURACY_COLUMN)?))
    }

    /// Dataset-size-normalized time cost of an epoch; lower is faster.
    ///
    /// Per epoch: `elapsed / (epoch + epoch_offset) / dataset_size`, then the
    /// mean over epochs times `speed_scale`.
    ///
    /// # Errors
    ///
    /// Returns error if the time or epoch column is not numeric.
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized_speed(&self, dataset_size: u64, calibration: &Calibration) -> Result<f64> {
        let elapsed = self.float_column(ELAPSED_TIME_COLUMN)?;
        let epochs = self.float_column(EPOCH_COLUMN)?;
        let offset = calibration.epoch_offset;
        let size = dataset_size as f64;

        let per_sample: Float64Array =
            arrow::compute::kernels::arity::binary(elapsed, epochs, |time, epoch| {
                time / (epoch + offset) / size
            })?;

        Ok(Self::mean(&per_sample) * calibration.speed_scale)
    }

    /// Accuracy and throughput of this log as experiment `experiment`.
    ///
    /// # Errors
    ///
    /// Returns error if a used column is not numeric.
    pub fn summarize(
        &self,
        experiment: impl Into<String>,
        dataset_size: u64,
        calibration: &Calibration,
    ) -> Result<ExperimentSummary> {
        Ok(ExperimentSummary::new(
            experiment,
            self.accuracy()?,
            self.normalized_speed(dataset_size, calibration)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: f64, epoch: f64, acc: f64) -> Vec<f64> {
        vec![0.0, time, epoch, 0.0, 0.0, acc]
    }

    #[test]
    fn test_accuracy_is_mean_of_column_five() {
        let log = ExperimentLog::from_rows("t", &[], &[row(1.0, 0.0, 0.5), row(2.0, 1.0, 0.7)])
            .unwrap();
        assert!((log.accuracy().unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(log.num_epochs(), 2);
    }

    #[test]
    fn test_normalized_speed_formula() {
        // 100 / (10 + 50) / 100 * 10000
        let log = ExperimentLog::from_rows("t", &[], &[row(100.0, 10.0, 0.9)]).unwrap();
        let speed = log.normalized_speed(100, &Calibration::default()).unwrap();
        assert!((speed - 166.666_666_666_666_66).abs() < 1e-9);
    }

    #[test]
    fn test_speed_is_mean_over_epochs() {
        let log = ExperimentLog::from_rows(
            "t",
            &[],
            &[row(50.0, 0.0, 0.1), row(110.0, 5.0, 0.1)],
        )
        .unwrap();
        // (1.0 + 2.0) / 2 / 10 * 10000
        let speed = log.normalized_speed(10, &Calibration::default()).unwrap();
        assert!((speed - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_nan_row_propagates() {
        let log = ExperimentLog::from_rows("t", &[], &[row(1.0, 0.0, f64::NAN), row(1.0, 0.0, 0.5)])
            .unwrap();
        assert!(log.accuracy().unwrap().is_nan());
    }

    #[test]
    fn test_too_few_columns() {
        let err = ExperimentLog::from_rows("short.csv", &[], &[vec![0.0; 5]]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("short.csv"));
        assert!(message.contains("at least 6 columns"));
    }

    #[test]
    fn test_ragged_rows() {
        let err = ExperimentLog::from_rows("r.csv", &[], &[vec![0.0; 6], vec![0.0; 7]])
            .unwrap_err();
        assert!(err.to_string().contains("data row 2 has 7 columns"));
    }

    #[test]
    fn test_csv_header_skipped_and_names_kept() {
        let text = "epoch,time,epochs,loss,val_loss,acc\n0,10,0,1.0,1.0,0.5\n1,20,1,0.5,0.6,0.7\n";
        let log = ExperimentLog::from_csv_reader("mem", text.as_bytes()).unwrap();
        assert_eq!(log.num_epochs(), 2);
        assert_eq!(log.batch().schema().field(5).name(), "acc");
        assert!((log.accuracy().unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_csv_empty_field_reads_as_nan() {
        let text = "a,b,c,d,e,f\n0,10,0,,,0.5\n";
        let log = ExperimentLog::from_csv_reader("mem", text.as_bytes()).unwrap();
        assert!((log.accuracy().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_csv_non_numeric_is_malformed() {
        let text = "a,b,c,d,e,f\n0,10,0,x,1,0.5\n";
        let err = ExperimentLog::from_csv_reader("bad.csv", text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedLog { .. }));
        assert!(err.to_string().contains("'x' is not numeric"));
    }

    #[test]
    fn test_csv_header_only_is_malformed() {
        let text = "a,b,c,d,e,f\n";
        let err = ExperimentLog::from_csv_reader("empty.csv", text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }
}
