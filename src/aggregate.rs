//! Metric aggregation: experiment logs -> raw speed matrix
//!
//! For every (architecture, dataset) cell the aggregator loads each of the
//! architecture's experiment logs, summarizes them, ranks the summaries by
//! accuracy and keeps the normalized speed of the best run.
//!
//! Toyota Way Principles:
//! - **Jidoka**: Malformed logs stop only their own experiment, and are reported
//! - **Genchi Genbutsu**: Missing logs are counted per cell, not hidden

use arrow::array::{Array, Float64Array, StringArray};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Architecture, Dataset, SpeedmapConfig};
use crate::experiment::{
    summary_batch, ExperimentSummary, LogOutcome, LogSource, ACCURACY_FIELD, EXPERIMENT_FIELD,
    SPEED_FIELD,
};
use crate::matrix::{Cell, ResultMatrix};
use crate::topk::{SortOrder, TopKSelection};
use crate::{Error, Result};

/// How cells are scheduled.
///
/// Both modes produce identical matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One cell after another: datasets outer, architectures inner
    Sequential,
    /// Cells on the rayon thread pool (falls back to sequential without the
    /// `parallel` feature)
    Parallel,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        if cfg!(feature = "parallel") {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

/// An experiment whose log could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedExperiment {
    /// Experiment identifier
    pub experiment: String,
    /// Rendered error, including the file path
    pub reason: String,
}

/// What happened while computing one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellDiagnostics {
    /// Row label
    pub architecture: String,
    /// Column label
    pub dataset: String,
    /// Experiments without a log
    pub missing: usize,
    /// Experiments skipped because their log was malformed
    pub malformed: Vec<MalformedExperiment>,
    /// Experiments whose speed became the cell value (empty for no-data cells)
    pub selected: Vec<String>,
}

impl CellDiagnostics {
    fn new(architecture: &Architecture, dataset: &Dataset) -> Self {
        Self {
            architecture: architecture.name.clone(),
            dataset: dataset.name.clone(),
            ..Self::default()
        }
    }
}

/// Aggregated speeds before normalization, with per-cell diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawMatrix {
    values: ResultMatrix,
    diagnostics: Vec<CellDiagnostics>,
}

impl RawMatrix {
    /// Cell values.
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

    /// Diagnostics of the cell at `(row, column)`.
    #[must_use]
    pub fn diagnostics(&self, row: usize, column: usize) -> &CellDiagnostics {
        &self.diagnostics[row * self.values.num_columns() + column]
    }

    /// Diagnostics of every cell, row-major.
    #[must_use]
    pub fn all_diagnostics(&self) -> &[CellDiagnostics] {
        &self.diagnostics
    }

    /// Missing logs over the whole matrix.
    #[must_use]
    pub fn total_missing(&self) -> usize {
        self.diagnostics.iter().map(|d| d.missing).sum()
    }

    /// Malformed logs over the whole matrix.
    #[must_use]
    pub fn total_malformed(&self) -> usize {
        self.diagnostics.iter().map(|d| d.malformed.len()).sum()
    }

    /// Rows with no-data cells shown as the legacy sentinel.
    #[must_use]
    pub fn to_sentinel_rows(&self) -> Vec<Vec<f64>> {
        self.values.to_sentinel_rows()
    }
}

/// Computes the raw speed matrix from a [`LogSource`].
#[derive(Debug, Clone, Copy)]
pub struct MetricAggregator<'a> {
    config: &'a SpeedmapConfig,
    mode: ExecutionMode,
}

impl<'a> MetricAggregator<'a> {
    /// Aggregator over `config` with the default execution mode.
    #[must_use]
    pub fn new(config: &'a SpeedmapConfig) -> Self {
        Self {
            config,
            mode: ExecutionMode::default(),
        }
    }

    /// Select the execution mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Execution mode in use.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Compute every cell.
    ///
    /// Missing and malformed logs never fail the run; they are recorded in
    /// the cell diagnostics.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration tables are invalid.
    pub fn aggregate<S: LogSource + ?Sized>(&self, source: &S) -> Result<RawMatrix> {
        self.config.validate_tables()?;

        let architectures = &self.config.architectures;
        let datasets = &self.config.datasets;
        let columns = datasets.len();
        let mut values = ResultMatrix::new(
            architectures.iter().map(|a| a.name.clone()).collect(),
            datasets.iter().map(|d| d.name.clone()).collect(),
        );
        let mut diagnostics = vec![CellDiagnostics::default(); architectures.len() * columns];

        let cells = self.compute_cells(source)?;
        for ((row, column), cell, diag) in cells {
            values.set(row, column, cell);
            diagnostics[row * columns + column] = diag;
        }

        let raw = RawMatrix {
            values,
            diagnostics,
        };
        info!(
            architectures = architectures.len(),
            datasets = columns,
            missing = raw.total_missing(),
            malformed = raw.total_malformed(),
            "aggregated raw speed matrix"
        );
        Ok(raw)
    }

    #[allow(clippy::type_complexity)]
    fn compute_cells<S: LogSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<((usize, usize), Cell, CellDiagnostics)>> {
        let architectures = &self.config.architectures;
        let datasets = &self.config.datasets;
        let positions: Vec<(usize, usize)> = (0..datasets.len())
            .flat_map(|column| (0..architectures.len()).map(move |row| (row, column)))
            .collect();

        let compute = |&(row, column): &(usize, usize)| {
            self.aggregate_cell(source, &architectures[row], &datasets[column])
                .map(|(cell, diag)| ((row, column), cell, diag))
        };

        match self.mode {
            #[cfg(feature = "parallel")]
            ExecutionMode::Parallel => {
                use rayon::prelude::*;
                positions.par_iter().map(compute).collect()
            }
            #[cfg(not(feature = "parallel"))]
            ExecutionMode::Parallel => positions.iter().map(compute).collect(),
            ExecutionMode::Sequential => positions.iter().map(compute).collect(),
        }
    }

    /// Compute a single cell.
    ///
    /// Missing logs enter the ranking as zero-accuracy, zero-speed
    /// experiments; malformed logs are left out of it. The cell value is the
    /// mean speed of the `selection_top_k` most accurate experiments (ties go
    /// to the earlier experiment), tagged no-data unless positive and finite.
    ///
    /// # Errors
    ///
    /// Returns error if the summaries cannot be ranked.
    pub fn aggregate_cell<S: LogSource + ?Sized>(
        &self,
        source: &S,
        architecture: &Architecture,
        dataset: &Dataset,
    ) -> Result<(Cell, CellDiagnostics)> {
        let mut diag = CellDiagnostics::new(architecture, dataset);
        let mut summaries = Vec::with_capacity(architecture.experiments.len());

        for experiment in &architecture.experiments {
            let loaded = match source.load(&dataset.name, experiment) {
                LogOutcome::Found(log) => {
                    debug!(
                        dataset = %dataset.name,
                        experiment = %experiment,
                        epochs = log.num_epochs(),
                        "loaded log"
                    );
                    log.summarize(experiment.as_str(), dataset.size, &self.config.calibration)
                }
                LogOutcome::NotFound => {
                    diag.missing += 1;
                    Ok(ExperimentSummary::absent(experiment.as_str()))
                }
                LogOutcome::Malformed(e) => Err(e),
            };

            match loaded {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!(
                        architecture = %architecture.name,
                        dataset = %dataset.name,
                        experiment = %experiment,
                        error = %e,
                        "skipping malformed experiment log"
                    );
                    diag.malformed.push(MalformedExperiment {
                        experiment: experiment.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let ranked = summary_batch(&summaries)?.top_k(
            ACCURACY_FIELD,
            self.config.selection_top_k,
            SortOrder::Descending,
        )?;
        let cell = if ranked.num_rows() == 0 {
            Cell::NoData
        } else {
            let speeds = ranked
                .column(SPEED_FIELD)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::Other("speed column is not Float64".to_string()))?;
            #[allow(clippy::cast_precision_loss)]
            let representative = speeds.values().iter().sum::<f64>() / speeds.len() as f64;
            Cell::from_representative(representative)
        };

        if cell.is_no_data() {
            debug!(
                architecture = %architecture.name,
                dataset = %dataset.name,
                missing = diag.missing,
                "no usable experiment for cell"
            );
        } else {
            let names = ranked
                .column(EXPERIMENT_FIELD)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::Other("experiment column is not Utf8".to_string()))?;
            diag.selected = (0..names.len()).map(|i| names.value(i).to_string()).collect();
        }

        Ok((cell, diag))
    }
}

/// Aggregate with the default execution mode.
///
/// # Errors
///
/// Returns error if the configuration is invalid.
pub fn aggregate<S: LogSource + ?Sized>(config: &SpeedmapConfig, source: &S) -> Result<RawMatrix> {
    MetricAggregator::new(config).aggregate(source)
}
