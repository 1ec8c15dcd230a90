use std::{fs, path::Path};

use ndarray::{Array2, ArrayView2, Axis};

use crate::{ForestErr, Result};

/// Names of the diabetes progression features, in the order models are trained with.
pub const FEATURE_NAMES: [&str; 10] = [
    "age", "sex", "bmi", "bp", "s1", "s2", "s3", "s4", "s5", "s6",
];

/// An in-memory tabular regression dataset.
///
/// Rows are samples, columns are features. The last column of a loaded file
/// is always the target.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    targets: Vec<f64>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `features` - A `(n_samples, n_features)` matrix.
    /// * `targets` - One target per sample.
    /// * `feature_names` - One name per feature column.
    ///
    /// # Returns
    /// An error if the dataset is empty or the dimensions disagree.
    pub fn new(
        features: Array2<f64>,
        targets: Vec<f64>,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        let (rows, cols) = features.dim();

        if rows == 0 {
            return Err(ForestErr::EmptyInput("dataset"));
        }

        if cols == 0 {
            return Err(ForestErr::EmptyInput("feature set"));
        }

        if targets.len() != rows {
            return Err(ForestErr::ShapeMismatch {
                what: "targets",
                got: targets.len(),
                expected: rows,
            });
        }

        if feature_names.len() != cols {
            return Err(ForestErr::ShapeMismatch {
                what: "feature names",
                got: feature_names.len(),
                expected: cols,
            });
        }

        Ok(Self {
            features,
            targets,
            feature_names,
        })
    }

    /// Reads a dataset from a delimited text file.
    ///
    /// See [`Dataset::parse`] for the accepted layouts.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a dataset from delimited text.
    ///
    /// The first non-blank line is a header. If it contains a comma the file
    /// is comma separated, otherwise it is split on whitespace (the layout of
    /// the raw diabetes file). Header names are lowercased. The last column
    /// is the target, every other column is a feature.
    ///
    /// # Returns
    /// An error naming the offending line if a cell fails to parse, is not
    /// finite, or a row has the wrong number of cells.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (header_line, header) = lines.next().ok_or(ForestErr::EmptyInput("dataset"))?;
        let comma = header.contains(',');
        let split = |line: &str| -> Vec<String> {
            if comma {
                line.split(',').map(|c| c.trim().to_string()).collect()
            } else {
                line.split_whitespace().map(str::to_string).collect()
            }
        };

        let columns: Vec<String> = split(header)
            .into_iter()
            .map(|c| c.to_lowercase())
            .collect();

        if columns.len() < 2 {
            return Err(ForestErr::Parse {
                line: header_line,
                msg: format!(
                    "expected at least one feature and a target, got {} column(s)",
                    columns.len()
                ),
            });
        }

        let n_features = columns.len() - 1;
        let mut data = Vec::new();
        let mut targets = Vec::new();

        for (line, row) in lines {
            let cells = split(row);
            if cells.len() != columns.len() {
                return Err(ForestErr::Parse {
                    line,
                    msg: format!("expected {} values, got {}", columns.len(), cells.len()),
                });
            }

            for (cell, name) in cells.iter().zip(&columns) {
                let value = cell.parse::<f64>().map_err(|_| ForestErr::Parse {
                    line,
                    msg: format!("cannot parse '{cell}' as a number for column {name}"),
                })?;

                if !value.is_finite() {
                    return Err(ForestErr::Parse {
                        line,
                        msg: format!("value for column {name} is not finite"),
                    });
                }

                data.push(value);
            }

            // The target was pushed last, move it out of the feature buffer.
            if let Some(target) = data.pop() {
                targets.push(target);
            }
        }

        let rows = targets.len();
        let features = Array2::from_shape_vec((rows, n_features), data).map_err(|e| {
            ForestErr::InvalidParam {
                name: "features",
                reason: e.to_string(),
            }
        })?;

        let mut feature_names = columns;
        feature_names.truncate(n_features);
        Self::new(features, targets, feature_names)
    }

    /// Mean-centres every feature column and scales it to unit L2 norm.
    ///
    /// Constant columns end up all zeros.
    pub fn scale(&mut self) {
        for mut column in self.features.columns_mut() {
            let mean = column.mean().unwrap_or_default();
            column.mapv_inplace(|x| x - mean);

            let norm = column.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                column.mapv_inplace(|x| x / norm);
            }
        }
    }

    /// Returns a new dataset made of the given rows, in the given order.
    ///
    /// Indices may repeat.
    ///
    /// # Panics
    /// If any index is out of bounds.
    pub fn select(&self, rows: &[usize]) -> Dataset {
        Self {
            features: self.features.select(Axis(0), rows),
            targets: rows.iter().map(|&i| self.targets[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    #[inline]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
