//! # Trueno-Speedmap: Relative Training Speed Across Architectures
//!
//! **Version**: 0.1.0
//!
//! Trueno-Speedmap reads per-epoch training logs of several neural-network
//! architectures on several datasets, keeps the most accurate run of each
//! (architecture, dataset) pair, and compares how fast each architecture
//! trains relative to the fastest one on the same dataset.
//!
//! ## Pipeline
//!
//! ```text
//! LogSource ──> MetricAggregator ──> RawMatrix ──> RelativeNormalizer ──> NormMatrix
//!                                                                          ├──> SpeedLossReport
//!                                                                          └──> HeatmapRenderer (SVG)
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: No-data cells are a tagged variant, never a magic number
//! - **Jidoka**: Malformed logs are reported with their path and skip only their experiment
//! - **Genchi Genbutsu**: Missing logs are counted per cell and inspectable
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_speedmap::config::{Architecture, Dataset, SpeedmapConfig};
//! use trueno_speedmap::experiment::InMemoryLogSource;
//! use trueno_speedmap::{aggregate, normalize};
//!
//! let config = SpeedmapConfig::new(
//!     vec![Architecture::new("CNN", ["exp01_cnn"]), Architecture::new("GRU", ["exp01_gru"])],
//!     vec![Dataset::new("toy", 100)],
//! );
//! let mut logs = InMemoryLogSource::new();
//! logs.insert_epochs("toy", "exp01_cnn", &[(100.0, 10.0, 0.9)]);
//! logs.insert_epochs("toy", "exp01_gru", &[(200.0, 10.0, 0.8)]);
//!
//! let raw = aggregate(&config, &logs)?;
//! let norm = normalize(&raw);
//! assert_eq!(norm.lookup("CNN", "toy").and_then(|c| c.value()), Some(1.0));
//! # Ok::<(), trueno_speedmap::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod experiment;
pub mod matrix;
pub mod normalize;
#[cfg(feature = "render")]
pub mod render;
pub mod report;
pub mod topk;

pub use aggregate::{aggregate, ExecutionMode, MetricAggregator, RawMatrix};
pub use config::SpeedmapConfig;
pub use error::{Error, Result};
pub use matrix::{Cell, ResultMatrix, NO_DATA_SENTINEL};
pub use normalize::{normalize, NormMatrix, RelativeNormalizer};
pub use report::SpeedLossReport;
