//! Result matrices: architectures (rows) x datasets (columns)
//!
//! Cells are tagged: a number, or [`Cell::NoData`] when no experiment
//! produced a usable value. [`ResultMatrix::to_sentinel_rows`] gives the
//! legacy view where no-data reads as [`NO_DATA_SENTINEL`].

use serde::{Deserialize, Serialize};

/// Legacy numeric marker for "no data" in the raw matrix.
pub const NO_DATA_SENTINEL: f64 = 666.0;

/// One heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// Measured value
    Value(f64),
    /// No experiment produced a positive, finite value
    NoData,
}

impl Cell {
    /// Tag a representative value: positive finite numbers are data,
    /// anything else (zero, negative, NaN, infinite) is no-data.
    #[must_use]
    pub fn from_representative(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self::Value(value)
        } else {
            Self::NoData
        }
    }

    /// The value, if any.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoData => None,
        }
    }

    /// Whether the cell holds no data.
    #[must_use]
    pub const fn is_no_data(self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Value with no-data mapped to [`NO_DATA_SENTINEL`].
    #[must_use]
    pub const fn or_sentinel(self) -> f64 {
        match self {
            Self::Value(v) => v,
            Self::NoData => NO_DATA_SENTINEL,
        }
    }
}

/// Dense row-major matrix of cells with row and column labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    architectures: Vec<String>,
    datasets: Vec<String>,
    cells: Vec<Cell>,
}

impl ResultMatrix {
    /// Matrix of the given shape filled with [`Cell::NoData`].
    #[must_use]
    pub fn new(architectures: Vec<String>, datasets: Vec<String>) -> Self {
        let cells = vec![Cell::NoData; architectures.len() * datasets.len()];
        Self {
            architectures,
            datasets,
            cells,
        }
    }

    /// Row labels.
    #[must_use]
    pub fn architectures(&self) -> &[String] {
        &self.architectures
    }

    /// Column labels.
    #[must_use]
    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.architectures.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.datasets.len()
    }

    /// Cell at `(row, column)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Cell {
        assert!(column < self.num_columns(), "column {column} out of bounds");
        self.cells[row * self.num_columns() + column]
    }

    /// Cell by labels.
    #[must_use]
    pub fn lookup(&self, architecture: &str, dataset: &str) -> Option<Cell> {
        let row = self.architectures.iter().position(|a| a == architecture)?;
        let column = self.datasets.iter().position(|d| d == dataset)?;
        Some(self.get(row, column))
    }

    /// Replace the cell at `(row, column)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    pub fn set(&mut self, row: usize, column: usize, cell: Cell) {
        assert!(column < self.num_columns(), "column {column} out of bounds");
        let columns = self.num_columns();
        self.cells[row * columns + column] = cell;
    }

    /// Cells of one row, in column order.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Cell] {
        let columns = self.num_columns();
        &self.cells[row * columns..(row + 1) * columns]
    }

    /// Cells of one column, in row order.
    #[must_use]
    pub fn column(&self, column: usize) -> Vec<Cell> {
        (0..self.num_rows()).map(|row| self.get(row, column)).collect()
    }

    /// Smallest value in a column, ignoring no-data cells.
    #[must_use]
    pub fn column_min(&self, column: usize) -> Option<f64> {
        self.column(column)
            .into_iter()
            .filter_map(Cell::value)
            .reduce(f64::min)
    }

    /// Rows as plain numbers, no-data as [`NO_DATA_SENTINEL`].
    #[must_use]
    pub fn to_sentinel_rows(&self) -> Vec<Vec<f64>> {
        (0..self.num_rows())
            .map(|row| self.row(row).iter().map(|c| c.or_sentinel()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_from_representative() {
        assert_eq!(Cell::from_representative(2.0), Cell::Value(2.0));
        assert_eq!(Cell::from_representative(0.0), Cell::NoData);
        assert_eq!(Cell::from_representative(-1.0), Cell::NoData);
        assert_eq!(Cell::from_representative(f64::NAN), Cell::NoData);
        assert_eq!(Cell::from_representative(f64::INFINITY), Cell::NoData);
    }

    #[test]
    fn test_row_major_layout() {
        let mut m = ResultMatrix::new(labels(&["LSTM", "CNN"]), labels(&["a", "b", "c"]));
        m.set(1, 2, Cell::Value(3.0));
        m.set(0, 1, Cell::Value(1.5));
        assert_eq!(m.get(1, 2), Cell::Value(3.0));
        assert_eq!(m.row(0), &[Cell::NoData, Cell::Value(1.5), Cell::NoData]);
        assert_eq!(m.column(2), vec![Cell::NoData, Cell::Value(3.0)]);
        assert_eq!(m.lookup("CNN", "c"), Some(Cell::Value(3.0)));
        assert_eq!(m.lookup("GRU", "c"), None);
    }

    #[test]
    fn test_column_min_skips_no_data() {
        let mut m = ResultMatrix::new(labels(&["x", "y", "z"]), labels(&["a"]));
        m.set(0, 0, Cell::Value(4.0));
        m.set(2, 0, Cell::Value(2.5));
        assert_eq!(m.column_min(0), Some(2.5));

        let empty = ResultMatrix::new(labels(&["x"]), labels(&["a"]));
        assert_eq!(empty.column_min(0), None);
    }

    #[test]
    fn test_sentinel_view() {
        let mut m = ResultMatrix::new(labels(&["x"]), labels(&["a", "b"]));
        m.set(0, 0, Cell::Value(1.25));
        assert_eq!(m.to_sentinel_rows(), vec![vec![1.25, NO_DATA_SENTINEL]]);
    }

    #[test]
    fn test_cell_serde_tags() {
        let json = serde_json::to_string(&[Cell::Value(1.5), Cell::NoData]).unwrap();
        assert_eq!(json, r#"[{"value":1.5},"no_data"]"#);
    }
}
