use crate::{ForestErr, Result};

/// A quality signal computed on held-out predictions.
pub trait Metric {
    /// Short human readable name.
    fn name(&self) -> &'static str;

    /// Computes the metric.
    ///
    /// # Errors
    /// Returns `ForestErr::ShapeMismatch` if the slices differ in length and
    /// `ForestErr::EmptyInput` if they are empty.
    fn compute(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64>;
}

fn check(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_pred.len() != y_true.len() {
        return Err(ForestErr::ShapeMismatch {
            what: "predictions",
            got: y_pred.len(),
            expected: y_true.len(),
        });
    }

    if y_true.is_empty() {
        return Err(ForestErr::EmptyInput("targets"));
    }

    Ok(())
}

/// Mean squared error. Lower is better.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Metric for Mse {
    fn name(&self) -> &'static str {
        "mse"
    }

    fn compute(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
        check(y_true, y_pred)?;

        let sum: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(y, p)| (y - p).powi(2))
            .sum();

        Ok(sum / y_true.len() as f64)
    }
}

/// Coefficient of determination. 1 is a perfect fit, 0 matches predicting the mean.
///
/// A constant target scores 1 when predicted exactly and 0 otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct R2;

impl Metric for R2 {
    fn name(&self) -> &'static str {
        "r2"
    }

    fn compute(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
        check(y_true, y_pred)?;

        let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
        let residual: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(y, p)| (y - p).powi(2))
            .sum();
        let total: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();

        if total == 0.0 {
            return Ok(if residual == 0.0 { 1.0 } else { 0.0 });
        }

        Ok(1.0 - residual / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_basic() {
        let mse = Mse.compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]).unwrap();
        assert!((mse - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn r2_perfect_and_mean() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(R2.compute(&y, &y).unwrap(), 1.0);
        assert_eq!(R2.compute(&y, &[2.5; 4]).unwrap(), 0.0);
    }

    #[test]
    fn r2_can_be_negative() {
        let r2 = R2.compute(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r2 + 3.0).abs() < 1e-12);
    }

    #[test]
    fn r2_constant_target() {
        assert_eq!(R2.compute(&[2.0, 2.0], &[2.0, 2.0]).unwrap(), 1.0);
        assert_eq!(R2.compute(&[2.0, 2.0], &[1.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn metrics_reject_mismatched_lengths() {
        assert!(matches!(
            Mse.compute(&[1.0], &[1.0, 2.0]),
            Err(ForestErr::ShapeMismatch { .. })
        ));
        assert!(matches!(R2.compute(&[], &[]), Err(ForestErr::EmptyInput(_))));
    }
}
