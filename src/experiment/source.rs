//! Log sources - where experiment logs come from
//!
//! The aggregator never touches the filesystem directly. It asks a
//! [`LogSource`] for `(dataset, experiment)` and branches on the typed
//! [`LogOutcome`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ExperimentLog;
use crate::Error;

/// Result of looking up one experiment log.
#[derive(Debug)]
pub enum LogOutcome {
    /// Log exists and parsed
    Found(ExperimentLog),
    /// No log for this pair; the experiment counts as missing
    NotFound,
    /// Log exists but cannot be used; the experiment is skipped
    Malformed(Error),
}

/// Provider of experiment logs keyed by dataset and experiment.
///
/// `Send + Sync` so cells can be computed on a thread pool.
pub trait LogSource: Send + Sync {
    /// Look up the log of `experiment` on `dataset`.
    fn load(&self, dataset: &str, experiment: &str) -> LogOutcome;
}

/// File name of a log: `{dataset}_{experiment}.csv`.
#[must_use]
pub fn log_file_name(dataset: &str, experiment: &str) -> String {
    format!("{dataset}_{experiment}.csv")
}

/// Directory of CSV logs named by [`log_file_name`].
#[derive(Debug, Clone)]
pub struct CsvLogDirectory {
    root: PathBuf,
}

impl CsvLogDirectory {
    /// Read logs from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being read.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a log.
    #[must_use]
    pub fn path_for(&self, dataset: &str, experiment: &str) -> PathBuf {
        self.root.join(log_file_name(dataset, experiment))
    }
}

impl LogSource for CsvLogDirectory {
    fn load(&self, dataset: &str, experiment: &str) -> LogOutcome {
        let path = self.path_for(dataset, experiment);
        if !path.is_file() {
            return LogOutcome::NotFound;
        }
        match ExperimentLog::from_csv_path(&path) {
            Ok(log) => LogOutcome::Found(log),
            Err(e) => LogOutcome::Malformed(e),
        }
    }
}

#[derive(Debug, Clone)]
enum StoredLog {
    Csv(String),
    Parsed(ExperimentLog),
}

/// In-memory log source for fixtures and embedding.
///
/// CSV text is parsed on every lookup, the same way a directory is.
///
/// # Example
///
/// ```rust
/// use trueno_speedmap::experiment::{InMemoryLogSource, LogOutcome, LogSource};
///
/// let mut source = InMemoryLogSource::new();
/// source.insert_csv("toy", "exp01_cnn", "e,t,n,a,b,acc\n0,100,10,0,0,0.9\n");
///
/// assert!(matches!(source.load("toy", "exp01_cnn"), LogOutcome::Found(_)));
/// assert!(matches!(source.load("toy", "exp02_cnn"), LogOutcome::NotFound));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogSource {
    logs: HashMap<String, StoredLog>,
}

impl InMemoryLogSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored logs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// Whether no logs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Store raw CSV text (header row included).
    pub fn insert_csv(&mut self, dataset: &str, experiment: &str, text: impl Into<String>) {
        self.logs
            .insert(log_file_name(dataset, experiment), StoredLog::Csv(text.into()));
    }

    /// Store an already-built log.
    pub fn insert_log(&mut self, dataset: &str, experiment: &str, log: ExperimentLog) {
        self.logs
            .insert(log_file_name(dataset, experiment), StoredLog::Parsed(log));
    }

    /// Store a log of epochs given as `(elapsed_time, epoch_counter, accuracy)`.
    ///
    /// Unused columns are filled with zeros.
    pub fn insert_epochs(&mut self, dataset: &str, experiment: &str, epochs: &[(f64, f64, f64)]) {
        let mut text = String::from("epoch,time,epochs,loss,val_loss,acc\n");
        for (i, (time, epoch, accuracy)) in epochs.iter().enumerate() {
            text.push_str(&format!("{i},{time},{epoch},0,0,{accuracy}\n"));
        }
        self.insert_csv(dataset, experiment, text);
    }
}

impl LogSource for InMemoryLogSource {
    fn load(&self, dataset: &str, experiment: &str) -> LogOutcome {
        let name = log_file_name(dataset, experiment);
        match self.logs.get(&name) {
            None => LogOutcome::NotFound,
            Some(StoredLog::Parsed(log)) => LogOutcome::Found(log.clone()),
            Some(StoredLog::Csv(text)) => {
                match ExperimentLog::from_csv_reader(format!("memory:{name}"), text.as_bytes()) {
                    Ok(log) => LogOutcome::Found(log),
                    Err(e) => LogOutcome::Malformed(e),
                }
            }
        }
    }
}
