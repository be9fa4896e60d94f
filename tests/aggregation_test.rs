//! Aggregation scenarios
//!
//! Selection, missing-log and end-to-end behavior of the
//! aggregate -> normalize pipeline on in-memory fixtures.

use trueno_speedmap::config::{Architecture, Dataset, SpeedmapConfig};
use trueno_speedmap::experiment::InMemoryLogSource;
use trueno_speedmap::{
    aggregate, normalize, Cell, ExecutionMode, MetricAggregator, NO_DATA_SENTINEL,
};

/// Elapsed time giving `speed` on a size-100 dataset at epoch counter 10.
fn elapsed_for_speed(speed: f64) -> f64 {
    speed / 10_000.0 * 100.0 * 60.0
}

fn single_cell(experiments: &[&str]) -> SpeedmapConfig {
    SpeedmapConfig::new(
        vec![Architecture::new("CNN", experiments.iter().copied())],
        vec![Dataset::new("toy", 100)],
    )
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_selects_speed_of_most_accurate_run() {
    let config = single_cell(&["exp01_cnn", "exp02_cnn"]);
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("toy", "exp01_cnn", &[(elapsed_for_speed(5.0), 10.0, 0.80)]);
    logs.insert_epochs("toy", "exp02_cnn", &[(elapsed_for_speed(3.0), 10.0, 0.95)]);

    let raw = aggregate(&config, &logs).unwrap();
    let value = raw.get(0, 0).value().unwrap();

    assert!((value - 3.0).abs() < 1e-9, "expected 3.0, got {value}");
    assert_eq!(raw.diagnostics(0, 0).selected, vec!["exp02_cnn"]);
}

#[test]
fn test_accuracy_tie_keeps_first_experiment() {
    let config = single_cell(&["a", "b"]);
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("toy", "a", &[(elapsed_for_speed(7.0), 10.0, 0.9)]);
    logs.insert_epochs("toy", "b", &[(elapsed_for_speed(2.0), 10.0, 0.9)]);

    let raw = aggregate(&config, &logs).unwrap();
    assert!((raw.get(0, 0).value().unwrap() - 7.0).abs() < 1e-9);
}

#[test]
fn test_accuracy_averages_all_epochs() {
    // Run "a" peaks higher but averages lower than "b"
    let config = single_cell(&["a", "b"]);
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs(
        "toy",
        "a",
        &[(elapsed_for_speed(4.0), 10.0, 0.2), (elapsed_for_speed(4.0), 10.0, 0.99)],
    );
    logs.insert_epochs(
        "toy",
        "b",
        &[(elapsed_for_speed(6.0), 10.0, 0.7), (elapsed_for_speed(6.0), 10.0, 0.7)],
    );

    let raw = aggregate(&config, &logs).unwrap();
    assert!((raw.get(0, 0).value().unwrap() - 6.0).abs() < 1e-9);
}

#[test]
fn test_nan_accuracy_run_ranks_first() {
    // "b" has an empty accuracy field, so its mean accuracy is NaN
    let config = single_cell(&["a", "b"]);
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("toy", "a", &[(60.0, 10.0, 0.9)]);
    logs.insert_csv("toy", "b", "epoch,time,epochs,loss,val_loss,acc\n0,120,10,0,0,\n");

    let raw = aggregate(&config, &logs).unwrap();

    assert_eq!(raw.diagnostics(0, 0).selected, vec!["b"]);
    assert!((raw.get(0, 0).value().unwrap() - 200.0).abs() < 1e-9);
    assert!(raw.diagnostics(0, 0).malformed.is_empty());
}

// =============================================================================
// Missing logs
// =============================================================================

#[test]
fn test_two_of_three_missing_uses_remaining_run() {
    let config = single_cell(&["exp01_cnn", "exp02_cnn", "exp03_cnn"]);
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("toy", "exp03_cnn", &[(elapsed_for_speed(2.0), 10.0, 0.6)]);

    let raw = aggregate(&config, &logs).unwrap();

    assert!((raw.get(0, 0).value().unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(raw.diagnostics(0, 0).missing, 2);
    assert_eq!(raw.total_missing(), 2);
}

#[test]
fn test_all_missing_is_no_data_and_sentinel() {
    let config = single_cell(&["exp01_cnn", "exp02_cnn", "exp03_cnn"]);
    let logs = InMemoryLogSource::new();

    let raw = aggregate(&config, &logs).unwrap();

    assert_eq!(raw.get(0, 0), Cell::NoData);
    assert_eq!(raw.to_sentinel_rows(), vec![vec![NO_DATA_SENTINEL]]);
    assert_eq!(raw.diagnostics(0, 0).missing, 3);
    assert!(raw.diagnostics(0, 0).selected.is_empty());
}

#[test]
fn test_single_row_log_is_summarized() {
    let config = single_cell(&["a"]);
    let mut logs = InMemoryLogSource::new();
    logs.insert_csv("toy", "a", "epoch,time,epochs,x,y,acc\n0,60,10,0,0,0.4\n");

    let raw = aggregate(&config, &logs).unwrap();
    assert!((raw.get(0, 0).value().unwrap() - 100.0).abs() < 1e-9);
}

// =============================================================================
// End to end
// =============================================================================

#[test]
fn test_end_to_end_two_architectures() {
    let config = SpeedmapConfig::new(
        vec![
            Architecture::new("CNN", ["exp01_cnn"]),
            Architecture::new("GRU", ["exp01_gru"]),
        ],
        vec![Dataset::new("toy", 100)],
    );
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("toy", "exp01_cnn", &[(100.0, 10.0, 0.9)]);
    logs.insert_epochs("toy", "exp01_gru", &[(200.0, 10.0, 0.8)]);

    let raw = aggregate(&config, &logs).unwrap();
    let cnn = raw.lookup("CNN", "toy").unwrap().value().unwrap();
    let gru = raw.lookup("GRU", "toy").unwrap().value().unwrap();
    assert!((cnn - 166.666_666_666_666_66).abs() < 1e-9);
    assert!((gru - 333.333_333_333_333_3).abs() < 1e-9);

    let norm = normalize(&raw);
    assert_eq!(norm.lookup("CNN", "toy"), Some(Cell::Value(1.0)));
    let ratio = norm.lookup("GRU", "toy").unwrap().value().unwrap();
    assert!((ratio - 2.0).abs() < 1e-9);
}

#[test]
fn test_aggregation_is_idempotent() {
    let config = SpeedmapConfig::new(
        vec![
            Architecture::new("GRU", ["g1", "g2"]),
            Architecture::new("CNN", ["c1", "c2"]),
        ],
        vec![Dataset::new("a", 500), Dataset::new("b", 2000)],
    );
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("a", "g1", &[(10.0, 0.0, 0.5), (20.0, 1.0, 0.6)]);
    logs.insert_epochs("a", "c2", &[(5.0, 0.0, 0.7)]);
    logs.insert_epochs("b", "g2", &[(40.0, 3.0, 0.1)]);
    logs.insert_epochs("b", "c1", &[(30.0, 3.0, 0.2)]);

    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let aggregator = MetricAggregator::new(&config).with_mode(mode);
        let first = aggregator.aggregate(&logs).unwrap();
        let second = aggregator.aggregate(&logs).unwrap();
        assert_eq!(first, second);
        assert_eq!(normalize(&first), normalize(&second));
    }
}

#[test]
fn test_malformed_log_does_not_abort_other_cells() {
    let config = SpeedmapConfig::new(
        vec![Architecture::new("CNN", ["run"])],
        vec![Dataset::new("good", 100), Dataset::new("bad", 100)],
    );
    let mut logs = InMemoryLogSource::new();
    logs.insert_epochs("good", "run", &[(60.0, 10.0, 0.9)]);
    logs.insert_csv("bad", "run", "a,b,c,d,e,f\n1,2,three,4,5,6\n");

    let raw = aggregate(&config, &logs).unwrap();

    assert!(matches!(raw.lookup("CNN", "good"), Some(Cell::Value(_))));
    assert_eq!(raw.lookup("CNN", "bad"), Some(Cell::NoData));
    let diag = raw.diagnostics(0, 1);
    assert_eq!(diag.malformed.len(), 1);
    assert!(diag.malformed[0].reason.contains("bad_run.csv"));
    assert!(diag.malformed[0].reason.contains("'three' is not numeric"));
}
