use ndarray::{ArrayView1, ArrayView2};

use crate::Result;

/// A fitted regression model.
///
/// A `Regressor` only evaluates. It does not own training data and is never
/// mutated by prediction, so a single instance can be shared between threads.
pub trait Regressor: Send + Sync {
    /// Returns the number of features every input row must have.
    fn n_features(&self) -> usize;

    /// Predicts the target for a single row.
    ///
    /// # Errors
    /// Returns `ForestErr::ShapeMismatch` if `row.len() != self.n_features()`.
    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64>;

    /// Predicts the target for a single row given as a slice.
    fn predict_one(&self, row: &[f64]) -> Result<f64> {
        self.predict_row(ArrayView1::from(row))
    }

    /// Predicts the target for every row of `x`.
    ///
    /// # Errors
    /// Returns `ForestErr::ShapeMismatch` if `x` has the wrong number of columns.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        x.outer_iter().map(|row| self.predict_row(row)).collect()
    }
}
