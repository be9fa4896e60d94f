//! Top-K selection algorithms
//!
//! Picks the best experiments of a cell without sorting the whole summary
//! table. Min-heap of size K, O(N log K).
//!
//! Ranking rules:
//! - Ties keep list order (the earlier row wins), matching a stable sort
//! - NaN compares above every number: first in descending order, last in
//!   ascending order
//!
//! Toyota Way Principles:
//! - **Kaizen**: Algorithmic improvement (O(N log N) → O(N log K))
//! - **Muda elimination**: Avoid unnecessary full sort

use crate::Error;
use arrow::array::{Array, ArrayRef, Float64Array, UInt32Array};
use arrow::record_batch::RecordBatch;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Sort order for Top-K selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (smallest K values)
    Ascending,
    /// Descending order (largest K values)
    Descending,
}

/// Trait for Top-K selection on record batches
pub trait TopKSelection {
    /// Select top K rows by a specific column
    ///
    /// # Arguments
    /// * `column_index` - Index of the column to rank by
    /// * `k` - Number of rows to select
    /// * `order` - Sort order (Ascending or Descending)
    ///
    /// # Returns
    /// A new `RecordBatch` with at most K rows, best first
    ///
    /// # Errors
    /// Returns error if:
    /// - Column index is out of bounds
    /// - Column data type is not `Float64`
    /// - K is zero
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trueno_speedmap::topk::{TopKSelection, SortOrder};
    /// use arrow::array::{Float64Array, RecordBatch};
    /// use arrow::datatypes::{DataType, Field, Schema};
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let schema = Arc::new(Schema::new(vec![
    ///     Field::new("accuracy", DataType::Float64, false),
    /// ]));
    /// let batch = RecordBatch::try_new(
    ///     schema,
    ///     vec![Arc::new(Float64Array::from(vec![0.8, 0.95, 0.7]))],
    /// )?;
    ///
    /// let best = batch.top_k(0, 1, SortOrder::Descending)?;
    /// assert_eq!(best.num_rows(), 1);
    /// # Ok(())
    /// # }
    /// ```
    fn top_k(&self, column_index: usize, k: usize, order: SortOrder) -> crate::Result<RecordBatch>;
}

impl TopKSelection for RecordBatch {
    fn top_k(&self, column_index: usize, k: usize, order: SortOrder) -> crate::Result<RecordBatch> {
        if column_index >= self.num_columns() {
            return Err(Error::InvalidInput(format!(
                "Column index {} out of bounds (batch has {} columns)",
                column_index,
                self.num_columns()
            )));
        }

        let indices = select_top_k_indices(self.column(column_index), k, order)?;
        let indices = UInt32Array::from(
            indices
                .into_iter()
                .map(|i| {
                    u32::try_from(i)
                        .map_err(|_| Error::InvalidInput(format!("row index {i} exceeds u32")))
                })
                .collect::<crate::Result<Vec<u32>>>()?,
        );

        Ok(arrow::compute::kernels::take::take_record_batch(
            self, &indices,
        )?)
    }
}

fn select_top_k_indices(
    column: &ArrayRef,
    k: usize,
    order: SortOrder,
) -> crate::Result<Vec<usize>> {
    match column.data_type() {
        arrow::datatypes::DataType::Float64 => {
            let array = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    Error::Other("Failed to downcast Float64 column to Float64Array".to_string())
                })?;
            let values: Vec<f64> = (0..array.len())
                .map(|i| if array.is_null(i) { f64::NAN } else { array.value(i) })
                .collect();
            top_k_indices(&values, k, order)
        }
        dt => Err(Error::InvalidInput(format!(
            "Top-K not supported for data type: {dt:?}"
        ))),
    }
}

// Heap entry; the heap's maximum is the worst-ranked entry kept so far.
#[derive(Debug)]
struct RankedItem {
    value: f64,
    index: usize,
    order: SortOrder,
}

impl RankedItem {
    /// `Less` means `self` ranks ahead of `other`.
    fn rank(&self, other: &Self) -> Ordering {
        // NaN sorts as the largest value
        let natural = match (self.value.is_nan(), other.value.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .value
                .partial_cmp(&other.value)
                .unwrap_or(Ordering::Equal),
        };
        let by_value = match self.order {
            SortOrder::Ascending => natural,
            SortOrder::Descending => natural.reverse(),
        };
        by_value.then(self.index.cmp(&other.index))
    }
}

impl PartialEq for RankedItem {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl Eq for RankedItem {}

impl Ord for RankedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other)
    }
}

impl PartialOrd for RankedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indices of the K best values, best first.
///
/// Time complexity: O(N log K), space O(K).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `k` is zero.
///
/// # Examples
///
/// ```rust
/// use trueno_speedmap::topk::{top_k_indices, SortOrder};
///
/// let order = top_k_indices(&[0.9, 0.95, 0.95, 0.1], 2, SortOrder::Descending).unwrap();
/// assert_eq!(order, vec![1, 2]);
/// ```
pub fn top_k_indices(values: &[f64], k: usize, order: SortOrder) -> crate::Result<Vec<usize>> {
    if k == 0 {
        return Err(Error::InvalidInput("k must be greater than 0".to_string()));
    }

    let mut heap: BinaryHeap<RankedItem> = BinaryHeap::with_capacity(k.min(values.len()));
    for (index, &value) in values.iter().enumerate() {
        let item = RankedItem {
            value,
            index,
            order,
        };
        if heap.len() < k {
            heap.push(item);
        } else if let Some(worst) = heap.peek() {
            if item < *worst {
                heap.pop();
                heap.push(item);
            }
        }
    }

    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|item| item.index)
        .collect())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use arrow::array::StringArray;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn create_test_batch(values: Vec<f64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("experiment", DataType::Utf8, false),
            Field::new("accuracy", DataType::Float64, false),
        ]));
        let names: Vec<String> = (0..values.len()).map(|i| format!("exp{i:02}")).collect();

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(names)),
                Arc::new(Float64Array::from(values)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_top_k_descending_basic() {
        let result = top_k_indices(&[1.0, 5.0, 3.0, 9.0, 2.0], 3, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![3, 1, 2]);
    }

    #[test]
    fn test_top_k_ascending_basic() {
        let result = top_k_indices(&[1.0, 5.0, 3.0, 9.0, 2.0], 3, SortOrder::Ascending).unwrap();
        assert_eq!(result, vec![0, 4, 2]);
    }

    #[test]
    fn test_top_k_ties_keep_list_order() {
        let result = top_k_indices(&[0.5, 0.9, 0.9, 0.9], 1, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![1]);

        let result = top_k_indices(&[0.9, 0.9, 0.9], 3, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![0, 1, 2]);
    }

    #[test]
    fn test_top_k_nan_sorts_as_largest() {
        let result = top_k_indices(&[0.2, f64::NAN, 0.9], 1, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![1]);

        let result = top_k_indices(&[0.2, f64::NAN, 0.9], 3, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![1, 2, 0]);

        let result = top_k_indices(&[f64::NAN, 0.2, 0.1], 3, SortOrder::Ascending).unwrap();
        assert_eq!(result, vec![2, 1, 0]);

        let result = top_k_indices(&[0.5, f64::NAN, f64::NAN], 1, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![1]);
    }

    #[test]
    fn test_top_k_k_greater_than_length() {
        let result = top_k_indices(&[3.0, 1.0, 2.0], 10, SortOrder::Descending).unwrap();
        assert_eq!(result, vec![0, 2, 1]);
    }

    #[test]
    fn test_top_k_empty_input() {
        let result = top_k_indices(&[], 1, SortOrder::Descending).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_top_k_k_zero_fails() {
        let result = top_k_indices(&[1.0], 0, SortOrder::Descending);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be greater than 0"));
    }

    #[test]
    fn test_batch_top_k_preserves_row_integrity() {
        let batch = create_test_batch(vec![0.80, 0.95, 0.70]);
        let result = batch.top_k(1, 2, SortOrder::Descending).unwrap();

        let names = result
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        let scores = result
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();

        assert_eq!(result.num_rows(), 2);
        assert_eq!(names.value(0), "exp01");
        assert_eq!(scores.value(0), 0.95);
        assert_eq!(names.value(1), "exp00");
        assert_eq!(scores.value(1), 0.80);
    }

    #[test]
    fn test_batch_top_k_invalid_column_index() {
        let batch = create_test_batch(vec![1.0, 2.0, 3.0]);
        let result = batch.top_k(99, 2, SortOrder::Descending);
        assert!(result.unwrap_err().to_string().contains("out of bounds"));
    }

    #[test]
    fn test_batch_top_k_unsupported_type() {
        let batch = create_test_batch(vec![1.0, 2.0]);
        let result = batch.top_k(0, 1, SortOrder::Descending);
        assert!(result.unwrap_err().to_string().contains("not supported"));
    }
}
