//! Experiment logs and their summaries
//!
//! ## Schema Overview
//!
//! ```text
//! LogSource ──load(dataset, experiment)──> LogOutcome
//!                                            ├── Found(ExperimentLog)  [one row per epoch]
//!                                            ├── NotFound
//!                                            └── Malformed(Error)
//!
//! ExperimentLog ──summarize──> ExperimentSummary (accuracy, normalized_speed)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_speedmap::config::Calibration;
//! use trueno_speedmap::experiment::{InMemoryLogSource, LogOutcome, LogSource};
//!
//! let mut source = InMemoryLogSource::new();
//! source.insert_epochs("toy", "exp01_cnn", &[(100.0, 10.0, 0.9)]);
//!
//! if let LogOutcome::Found(log) = source.load("toy", "exp01_cnn") {
//!     let summary = log.summarize("exp01_cnn", 100, &Calibration::default())?;
//!     assert!((summary.normalized_speed() - 166.666).abs() < 1e-3);
//! }
//! # Ok::<(), trueno_speedmap::Error>(())
//! ```

mod log;
mod source;
mod summary;

pub use log::{ExperimentLog, ACCURACY_COLUMN, ELAPSED_TIME_COLUMN, EPOCH_COLUMN, MIN_COLUMNS};
pub use source::{log_file_name, CsvLogDirectory, InMemoryLogSource, LogOutcome, LogSource};
pub use summary::{summary_batch, ExperimentSummary, ACCURACY_FIELD, EXPERIMENT_FIELD, SPEED_FIELD};
