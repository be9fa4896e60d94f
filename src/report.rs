//! Speed-loss summary printed after a run
//!
//! For each architecture other than the reference, the loss is the sum of its
//! normalized row times [`SPEED_LOSS_SCALE`]. With ten datasets this reads as
//! the average percentage.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalize::NormMatrix;
use crate::{Error, Result};

/// Multiplier on the summed normalized row.
pub const SPEED_LOSS_SCALE: f64 = 10.0;

/// Loss of one architecture against the reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedLoss {
    /// Architecture compared to the reference
    pub architecture: String,
    /// Position in the printed comparison (the reference is 1)
    pub rank: usize,
    /// Row sum times [`SPEED_LOSS_SCALE`]
    pub value: f64,
}

/// Speed-loss lines for every non-reference architecture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedLossReport {
    reference: String,
    entries: Vec<SpeedLoss>,
    generated_at: DateTime<Utc>,
}

impl SpeedLossReport {
    /// Build the report.
    ///
    /// Architectures are listed nearest-first going up from the reference
    /// row, then wrapping to the rows below it. For the default table
    /// (LSTM, biLSTM, GRU, CNN) with CNN as reference this gives GRU, biLSTM,
    /// LSTM.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownArchitecture`] if `reference` is not a row
    /// - [`Error::DegenerateColumn`] if any column could not be normalized
    /// - [`Error::IncompleteRow`] if a summed row has a no-data cell
    pub fn from_norm(norm: &NormMatrix, reference: &str) -> Result<Self> {
        let values = norm.values();
        let architectures = values.architectures();
        let reference_row = architectures
            .iter()
            .position(|a| a == reference)
            .ok_or_else(|| Error::UnknownArchitecture(reference.to_string()))?;
        norm.ensure_complete()?;

        let order = (0..reference_row)
            .rev()
            .chain(reference_row + 1..architectures.len());
        let entries = order
            .enumerate()
            .map(|(position, row)| {
                let sum = values
                    .row(row)
                    .iter()
                    .zip(values.datasets())
                    .map(|(cell, dataset)| {
                        cell.value().ok_or_else(|| Error::IncompleteRow {
                            architecture: architectures[row].clone(),
                            dataset: dataset.clone(),
                        })
                    })
                    .sum::<Result<f64>>()?;
                Ok(SpeedLoss {
                    architecture: architectures[row].clone(),
                    rank: position + 2,
                    value: sum * SPEED_LOSS_SCALE,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            reference: reference.to_string(),
            entries,
            generated_at: Utc::now(),
        })
    }

    /// Reference architecture.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// One entry per compared architecture.
    #[must_use]
    pub fn entries(&self) -> &[SpeedLoss] {
        &self.entries
    }

    /// When the report was built.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

impl fmt::Display for SpeedLossReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "Average speed loss 1-{}, {}-{}: {:5.3}",
                self.reference, entry.rank, entry.architecture, entry.value
            )?;
        }
        Ok(())
    }
}
