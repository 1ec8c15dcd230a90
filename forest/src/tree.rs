use ndarray::{ArrayView1, ArrayView2};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{ForestErr, Regressor, Result};

/// Feature values closer than this are never separated by a split.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Growth limits for a single regression tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth of the tree, unbounded when `None`.
    pub max_depth: Option<usize>,
    /// Minimum number of samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum number of samples every leaf must keep.
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeParams {
    /// Checks the parameters are usable for growing a tree.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(ForestErr::InvalidParam {
                name: "max_depth",
                reason: "must be at least 1".into(),
            });
        }

        if self.min_samples_split < 2 {
            return Err(ForestErr::InvalidParam {
                name: "min_samples_split",
                reason: format!("must be at least 2, got {}", self.min_samples_split),
            });
        }

        if self.min_samples_leaf < 1 {
            return Err(ForestErr::InvalidParam {
                name: "min_samples_leaf",
                reason: "must be at least 1".into(),
            });
        }

        Ok(())
    }
}

/// A node of a regression tree, stored in a flat arena.
///
/// Children are always stored after their parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Rows with `row[feature] <= threshold` go to `left`, the rest to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A CART regression tree fitted with the squared error criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    n_features: usize,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Grows a tree on a subset of the rows of `x`.
    ///
    /// # Arguments
    /// * `x` - The full `(n_samples, n_features)` feature matrix.
    /// * `y` - One target per row of `x`.
    /// * `rows` - The rows to train on. Indices may repeat (bootstrap samples).
    /// * `params` - The growth limits.
    /// * `rng` - Drives the order in which features are visited at each node.
    ///
    /// # Returns
    /// An error if the parameters are invalid, `rows` is empty or out of
    /// bounds, or `y` does not match `x`.
    pub fn fit<R: Rng>(
        x: ArrayView2<f64>,
        y: &[f64],
        rows: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self> {
        params.validate()?;

        let (n_rows, n_features) = x.dim();
        if y.len() != n_rows {
            return Err(ForestErr::ShapeMismatch {
                what: "targets",
                got: y.len(),
                expected: n_rows,
            });
        }

        if rows.is_empty() {
            return Err(ForestErr::EmptyInput("training rows"));
        }

        if let Some(&row) = rows.iter().find(|&&row| row >= n_rows) {
            return Err(ForestErr::InvalidParam {
                name: "rows",
                reason: format!("row {row} is out of bounds for {n_rows} samples"),
            });
        }

        let mut grower = Grower {
            x,
            y,
            params,
            rng,
            features: (0..n_features).collect(),
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
            scratch: Vec::with_capacity(rows.len()),
        };

        let mut rows = rows.to_vec();
        grower.grow(&mut rows, 0);

        let Grower {
            nodes,
            mut importances,
            ..
        } = grower;

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(Self {
            n_features,
            nodes,
            importances,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Returns the length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut stack = vec![(0, 0)];

        while let Some((id, d)) = stack.pop() {
            depth = depth.max(d);
            if let Some(Node::Split { left, right, .. }) = self.nodes.get(id) {
                stack.push((*left, d + 1));
                stack.push((*right, d + 1));
            }
        }

        depth
    }

    /// Returns the normalized impurity decrease attributed to each feature.
    ///
    /// All zeros when the tree is a single leaf.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Checks the arena is well formed, so walking it always terminates.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForestErr::InvalidModel("tree has no nodes".into()));
        }

        if self.importances.len() != self.n_features {
            return Err(ForestErr::InvalidModel(format!(
                "tree has {} importances for {} features",
                self.importances.len(),
                self.n_features
            )));
        }

        for (id, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if feature >= self.n_features {
                        return Err(ForestErr::InvalidModel(format!(
                            "node {id} splits on feature {feature} of {}",
                            self.n_features
                        )));
                    }

                    let len = self.nodes.len();
                    if left <= id || right <= id || left >= len || right >= len {
                        return Err(ForestErr::InvalidModel(format!(
                            "node {id} has invalid children ({left}, {right})"
                        )));
                    }
                }
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(ForestErr::InvalidModel(format!(
                        "leaf {id} holds a non-finite value"
                    )));
                }
                Node::Leaf { .. } => {}
            }
        }

        Ok(())
    }

    fn leaf_value(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}

impl Regressor for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(ForestErr::ShapeMismatch {
                what: "row",
                got: row.len(),
                expected: self.n_features,
            });
        }

        Ok(self.leaf_value(row))
    }
}

/// The best split found for a node.
struct Split {
    feature: usize,
    threshold: f64,
    n_left: usize,
    /// `sum_left² / n_left + sum_right² / n_right`, maximized by the search.
    proxy: f64,
}

/// Depth-first tree builder.
struct Grower<'a, R> {
    x: ArrayView2<'a, f64>,
    y: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut R,
    features: Vec<usize>,
    nodes: Vec<Node>,
    importances: Vec<f64>,
    scratch: Vec<(f64, f64)>,
}

impl<R: Rng> Grower<'_, R> {
    /// Grows the subtree for `rows` and returns the id of its root.
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let n = rows.len();
        let y = self.y;
        let sum: f64 = rows.iter().map(|&r| y[r]).sum();
        let mean = sum / n as f64;
        let impurity = rows
            .iter()
            .map(|&r| (y[r] - mean) * (y[r] - mean))
            .sum::<f64>()
            / n as f64;

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let params = self.params;
        if n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
            || params.max_depth.is_some_and(|max| depth >= max)
            || impurity <= f64::EPSILON
        {
            return id;
        }

        let Some(split) = self.best_split(rows, sum) else {
            return id;
        };

        let x = self.x;
        let n_left = partition(rows, |r| x[[r, split.feature]] <= split.threshold);
        debug_assert_eq!(n_left, split.n_left);

        self.importances[split.feature] += split.proxy - sum * sum / n as f64;

        let (left_rows, right_rows) = rows.split_at_mut(n_left);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        id
    }

    fn best_split(&mut self, rows: &[usize], sum: f64) -> Option<Split> {
        let (x, y) = (self.x, self.y);
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut best: Option<Split> = None;

        self.features.shuffle(&mut *self.rng);

        for &feature in &self.features {
            self.scratch.clear();
            self.scratch
                .extend(rows.iter().map(|&r| (x[[r, feature]], y[r])));
            self.scratch.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            if self.scratch[n - 1].0 <= self.scratch[0].0 + FEATURE_THRESHOLD {
                continue;
            }

            let mut sum_left = 0.0;
            for i in 0..n - 1 {
                let (value, target) = self.scratch[i];
                let next = self.scratch[i + 1].0;
                sum_left += target;

                if next <= value + FEATURE_THRESHOLD {
                    continue;
                }

                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let sum_right = sum - sum_left;
                let proxy = sum_left * sum_left / n_left as f64
                    + sum_right * sum_right / n_right as f64;

                if best.as_ref().is_none_or(|b| proxy > b.proxy) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    if threshold == next || !threshold.is_finite() {
                        threshold = value;
                    }

                    best = Some(Split {
                        feature,
                        threshold,
                        n_left,
                        proxy,
                    });
                }
            }
        }

        best
    }
}

/// Moves every row satisfying `goes_left` to the front and returns how many there are.
fn partition(rows: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut n_left = 0;
    for i in 0..rows.len() {
        if goes_left(rows[i]) {
            rows.swap(i, n_left);
            n_left += 1;
        }
    }
    n_left
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn fit(x: &Array2<f64>, y: &[f64], params: TreeParams) -> DecisionTree {
        let rows: Vec<usize> = (0..y.len()).collect();
        let mut rng = StdRng::seed_from_u64(0);
        DecisionTree::fit(x.view(), y, &rows, &params, &mut rng).unwrap()
    }

    #[test]
    fn fits_a_step_function() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let tree = fit(&x, &[0.0, 0.0, 10.0, 10.0], TreeParams::default());

        assert_eq!(
            tree.nodes()[0],
            Node::Split {
                feature: 0,
                threshold: 2.5,
                left: 1,
                right: 2
            }
        );
        assert_eq!(tree.predict_row(array![1.5].view()).unwrap(), 0.0);
        assert_eq!(tree.predict_row(array![2.5].view()).unwrap(), 0.0);
        assert_eq!(tree.predict_row(array![3.5].view()).unwrap(), 10.0);
    }

    #[test]
    fn pure_targets_make_a_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let tree = fit(&x, &[7.0, 7.0, 7.0], TreeParams::default());

        assert_eq!(tree.nodes(), [Node::Leaf { value: 7.0 }]);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.feature_importances(), [0.0]);
    }

    #[test]
    fn constant_large_targets_are_not_split() {
        let x = Array2::from_shape_fn((11, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = [346.1; 11];
        let tree = fit(&x, &y, TreeParams::default());

        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.nodes().len(), 1);

        let y = [151.3, 151.3, 151.3, 151.3, 151.3, 151.3, 151.3, 25.0];
        let x = Array2::from_shape_fn((8, 1), |(i, _)| i as f64);
        let tree = fit(&x, &y, TreeParams::default());

        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let tree = fit(&x, &y, params);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn unbounded_tree_memorizes_training_rows() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = [3.0, -1.0, 4.0, 1.0, 5.0];
        let tree = fit(&x, &y, TreeParams::default());

        let pred = tree.predict(x.view()).unwrap();
        assert_eq!(pred, y);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = [1.0, 9.0, 2.0, 8.0, 3.0, 7.0];
        let params = TreeParams {
            min_samples_leaf: 3,
            ..TreeParams::default()
        };
        let tree = fit(&x, &y, params);

        assert!(tree.n_leaves() <= 2);
    }

    #[test]
    fn importances_favour_the_informative_feature() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let tree = fit(&x, &[0.0, 0.0, 10.0, 10.0], TreeParams::default());

        assert_eq!(tree.feature_importances(), [1.0, 0.0]);
    }

    #[test]
    fn bootstrap_rows_may_repeat() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = [0.0, 6.0, 12.0];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(
            x.view(),
            &y,
            &[0, 0, 2],
            &TreeParams::default(),
            &mut rng,
        )
        .unwrap();

        // Row 1 was never drawn, the split sits halfway between rows 0 and 2.
        assert_eq!(tree.predict_row(array![2.0].view()).unwrap(), 0.0);
        assert_eq!(tree.predict_row(array![2.1].view()).unwrap(), 12.0);
    }

    #[test]
    fn rejects_out_of_bounds_rows() {
        let x = array![[1.0], [2.0]];
        let mut rng = StdRng::seed_from_u64(0);
        let res = DecisionTree::fit(x.view(), &[1.0, 2.0], &[5], &TreeParams::default(), &mut rng);

        assert!(matches!(res, Err(ForestErr::InvalidParam { name: "rows", .. })));
    }

    #[test]
    fn predict_rejects_wrong_arity() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let tree = fit(&x, &[1.0, 2.0], TreeParams::default());

        assert!(matches!(
            tree.predict_row(array![1.0].view()),
            Err(ForestErr::ShapeMismatch { got: 1, expected: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_backward_children() {
        let tree = DecisionTree {
            n_features: 1,
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
            importances: vec![0.0],
        };

        assert!(matches!(tree.validate(), Err(ForestErr::InvalidModel(_))));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = TreeParams {
            min_samples_split: 1,
            ..TreeParams::default()
        };
        assert!(params.validate().is_err());
    }
}
