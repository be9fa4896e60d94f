//! Relative normalization: each dataset column divided by its minimum
//!
//! After normalization the fastest architecture on a dataset reads exactly
//! 1.0 and the others read "N times slower". The matrix stays positive; the
//! renderer negates it for color intensity.

use serde::Serialize;
use tracing::warn;

use crate::aggregate::RawMatrix;
use crate::matrix::{Cell, ResultMatrix};
use crate::{Error, Result};

/// Column-normalized speed ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormMatrix {
    values: ResultMatrix,
    degenerate_columns: Vec<String>,
}

impl NormMatrix {
    /// Cell values; no-data cells stay no-data.
    #[must_use]
    pub const fn values(&self) -> &ResultMatrix {
        &self.values
    }

    /// Cell at `(row, column)`.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Cell {
        self.values.get(row, column)
    }

    /// Cell by labels.
    #[must_use]
    pub fn lookup(&self, architecture: &str, dataset: &str) -> Option<Cell> {
        self.values.lookup(architecture, dataset)
    }

    /// Datasets whose column had no data at all.
    #[must_use]
    pub fn degenerate_columns(&self) -> &[String] {
        &self.degenerate_columns
    }

    /// Whether column `column` could not be normalized.
    #[must_use]
    pub fn is_degenerate(&self, column: usize) -> bool {
        let dataset = &self.values.datasets()[column];
        self.degenerate_columns.iter().any(|d| d == dataset)
    }

    /// Fail if any column is degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateColumn`] naming the first such dataset.
    pub fn ensure_complete(&self) -> Result<()> {
        match self.degenerate_columns.first() {
            Some(dataset) => Err(Error::DegenerateColumn {
                dataset: dataset.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Divides every column of a [`RawMatrix`] by its minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeNormalizer;

impl RelativeNormalizer {
    /// Create a normalizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Normalize column-wise.
    ///
    /// A column whose cells are all no-data has no minimum; it is recorded
    /// as degenerate and left as no-data rather than divided by a marker.
    #[must_use]
    pub fn normalize(&self, raw: &RawMatrix) -> NormMatrix {
        let source = raw.values();
        let mut values = ResultMatrix::new(source.architectures().to_vec(), source.datasets().to_vec());
        let mut degenerate_columns = Vec::new();

        for column in 0..source.num_columns() {
            let Some(min) = source.column_min(column) else {
                let dataset = &source.datasets()[column];
                warn!(dataset = %dataset, "column has no data, cannot normalize");
                degenerate_columns.push(dataset.clone());
                continue;
            };
            for row in 0..source.num_rows() {
                let cell = match source.get(row, column) {
                    Cell::Value(v) => Cell::Value(v / min),
                    Cell::NoData => Cell::NoData,
                };
                values.set(row, column, cell);
            }
        }

        NormMatrix {
            values,
            degenerate_columns,
        }
    }
}

/// Normalize with the default normalizer.
#[must_use]
pub fn normalize(raw: &RawMatrix) -> NormMatrix {
    RelativeNormalizer::new().normalize(raw)
}
