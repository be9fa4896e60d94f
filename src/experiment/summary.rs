//! Experiment Summary - the two numbers a run contributes to its cell

use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Column of [`summary_batch`] holding the experiment identifier.
pub const EXPERIMENT_FIELD: usize = 0;

/// Column of [`summary_batch`] holding the mean accuracy.
pub const ACCURACY_FIELD: usize = 1;

/// Column of [`summary_batch`] holding the normalized speed.
pub const SPEED_FIELD: usize = 2;

/// Accuracy and normalized speed of one experiment on one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    experiment: String,
    accuracy: f64,
    normalized_speed: f64,
    present: bool,
}

impl ExperimentSummary {
    /// Summary of an experiment whose log was loaded.
    #[must_use]
    pub fn new(experiment: impl Into<String>, accuracy: f64, normalized_speed: f64) -> Self {
        Self {
            experiment: experiment.into(),
            accuracy,
            normalized_speed,
            present: true,
        }
    }

    /// Placeholder for an experiment without a log: zero accuracy, zero speed.
    ///
    /// It still takes part in ranking but loses to any positive accuracy.
    #[must_use]
    pub fn absent(experiment: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            accuracy: 0.0,
            normalized_speed: 0.0,
            present: false,
        }
    }

    /// Experiment identifier.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Mean accuracy over epochs.
    #[must_use]
    pub const fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Dataset-size-normalized time cost; lower is faster.
    #[must_use]
    pub const fn normalized_speed(&self) -> f64 {
        self.normalized_speed
    }

    /// Whether the summary came from an actual log.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }
}

/// Lay out a cell's summaries as an Arrow batch, in experiment-list order.
///
/// # Errors
///
/// Returns error if the batch cannot be assembled.
pub fn summary_batch(summaries: &[ExperimentSummary]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("experiment", DataType::Utf8, false),
        Field::new("accuracy", DataType::Float64, false),
        Field::new("normalized_speed", DataType::Float64, false),
    ]));

    let experiments: Vec<&str> = summaries.iter().map(ExperimentSummary::experiment).collect();
    let accuracies: Vec<f64> = summaries.iter().map(ExperimentSummary::accuracy).collect();
    let speeds: Vec<f64> = summaries
        .iter()
        .map(ExperimentSummary::normalized_speed)
        .collect();

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(experiments)),
            Arc::new(Float64Array::from(accuracies)),
            Arc::new(Float64Array::from(speeds)),
        ],
    )?)
}
