//! Aggregation configuration
//!
//! The architecture and dataset tables are plain values handed to the
//! aggregator, so tests can run against small synthetic fixtures while the
//! binary uses [`SpeedmapConfig::default`] or a JSON file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Epoch offset added to the epoch counter before dividing elapsed time.
///
/// Accounts for a fixed warm-up/checkpoint cost in the training logs.
pub const DEFAULT_EPOCH_OFFSET: f64 = 50.0;

/// Multiplier applied to the per-sample time cost.
pub const DEFAULT_SPEED_SCALE: f64 = 10_000.0;

/// Architecture that speed-loss summaries compare against.
pub const DEFAULT_REFERENCE: &str = "CNN";

/// A model family and the experiment runs trained for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Display name (heatmap row label)
    pub name: String,
    /// Experiment identifiers, in ranking tie-break order
    pub experiments: Vec<String>,
}

impl Architecture {
    /// Create an architecture from a name and its experiment identifiers.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, experiments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            experiments: experiments.into_iter().map(Into::into).collect(),
        }
    }

    /// `exp01_{suffix}` .. `exp{count}_{suffix}`
    fn numbered(name: &str, suffix: &str, count: usize) -> Self {
        Self::new(name, (1..=count).map(|i| format!("exp{i:02}_{suffix}")))
    }
}

/// A dataset and its sample count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Display name (heatmap column label, log file prefix)
    pub name: String,
    /// Number of samples, used as the throughput divisor
    pub size: u64,
}

impl Dataset {
    /// Create a dataset entry.
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Constants of the throughput formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Added to the epoch counter column
    pub epoch_offset: f64,
    /// Multiplier on the per-sample time cost
    pub speed_scale: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            epoch_offset: DEFAULT_EPOCH_OFFSET,
            speed_scale: DEFAULT_SPEED_SCALE,
        }
    }
}

/// Full configuration of a speed-map run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedmapConfig {
    /// Heatmap rows, in display order
    pub architectures: Vec<Architecture>,
    /// Heatmap columns, in display order
    pub datasets: Vec<Dataset>,
    /// Throughput formula constants
    pub calibration: Calibration,
    /// Number of top-accuracy experiments averaged into a cell (1 = best run only)
    pub selection_top_k: usize,
    /// Architecture the speed-loss report compares against
    pub reference_architecture: String,
    /// Directory holding `{dataset}_{experiment}.csv` logs
    pub log_dir: Option<PathBuf>,
}

impl Default for SpeedmapConfig {
    fn default() -> Self {
        Self {
            architectures: vec![
                Architecture::numbered("LSTM", "lstm", 6),
                Architecture::numbered("biLSTM", "bilstm", 6),
                Architecture::numbered("GRU", "gru", 9),
                Architecture::numbered("CNN", "cnn", 9),
            ],
            datasets: vec![
                Dataset::new("activemiles", 32_548),
                Dataset::new("hhar", 151_840),
                Dataset::new("fusion", 39_523),
                Dataset::new("mhealth", 8_566),
                Dataset::new("swell", 8_064),
                Dataset::new("usc-had", 17_412),
                Dataset::new("uci-har", 8_771),
                Dataset::new("pamap2", 143_572),
                Dataset::new("opportunity", 36_169),
                Dataset::new("realworld", 125_411),
            ],
            calibration: Calibration::default(),
            selection_top_k: 1,
            reference_architecture: DEFAULT_REFERENCE.to_string(),
            log_dir: None,
        }
    }
}

impl SpeedmapConfig {
    /// Build a config from explicit tables, keeping the other defaults.
    #[must_use]
    pub fn new(architectures: Vec<Architecture>, datasets: Vec<Dataset>) -> Self {
        Self {
            architectures,
            datasets,
            ..Self::default()
        }
    }

    /// Set the number of top-accuracy experiments averaged per cell.
    #[must_use]
    pub const fn with_top_k(mut self, k: usize) -> Self {
        self.selection_top_k = k;
        self
    }

    /// Set the reference architecture for speed-loss summaries.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_architecture = reference.into();
        self
    }

    /// Set the log directory.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Parse and validate a JSON configuration.
    ///
    /// Missing fields fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is invalid or [`validate`](Self::validate) fails
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or its contents are invalid
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Full check: [`validate_tables`](Self::validate_tables) plus the
    /// reference architecture used by speed-loss summaries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the tables are invalid or the
    /// reference architecture is not in the table.
    pub fn validate(&self) -> Result<()> {
        self.validate_tables()?;
        if self.architecture_index(&self.reference_architecture).is_none() {
            return Err(Error::InvalidConfig(format!(
                "reference architecture '{}' is not configured",
                self.reference_architecture
            )));
        }
        Ok(())
    }

    /// Check the tables for problems that would make every cell meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] on empty tables, duplicate names, empty
    /// experiment lists, zero dataset sizes, zero top-K or a non-positive
    /// speed scale.
    pub fn validate_tables(&self) -> Result<()> {
        if self.architectures.is_empty() {
            return Err(Error::InvalidConfig("no architectures configured".into()));
        }
        if self.datasets.is_empty() {
            return Err(Error::InvalidConfig("no datasets configured".into()));
        }

        let mut seen = HashSet::new();
        for arch in &self.architectures {
            if !seen.insert(arch.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate architecture '{}'",
                    arch.name
                )));
            }
            if arch.experiments.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "architecture '{}' has no experiments",
                    arch.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate dataset '{}'",
                    dataset.name
                )));
            }
            if dataset.size == 0 {
                return Err(Error::InvalidConfig(format!(
                    "dataset '{}' has size 0",
                    dataset.name
                )));
            }
        }

        if self.selection_top_k == 0 {
            return Err(Error::InvalidConfig("selection_top_k must be at least 1".into()));
        }
        if !(self.calibration.speed_scale.is_finite() && self.calibration.speed_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "speed_scale must be positive, got {}",
                self.calibration.speed_scale
            )));
        }
        if !self.calibration.epoch_offset.is_finite() {
            return Err(Error::InvalidConfig("epoch_offset must be finite".into()));
        }
        Ok(())
    }

    /// Row index of an architecture by name.
    #[must_use]
    pub fn architecture_index(&self, name: &str) -> Option<usize> {
        self.architectures.iter().position(|a| a.name == name)
    }
}
