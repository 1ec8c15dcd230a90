use log::{debug, info};
use ndarray::ArrayView1;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Dataset, DecisionTree, ForestErr, Regressor, Result, TreeParams};

/// Hyperparameters of a random forest regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Growth limits shared by every tree.
    pub tree: TreeParams,
    /// Whether each tree sees a bootstrap sample or the whole training set.
    pub bootstrap: bool,
    /// Seed for bootstrap sampling and feature ordering.
    pub seed: u64,
    /// Number of threads used to fit trees. Results do not depend on it.
    pub n_jobs: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 42,
            n_jobs: 1,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForestErr::InvalidParam {
                name: "n_estimators",
                reason: "must be at least 1".into(),
            });
        }

        if self.n_jobs == 0 {
            return Err(ForestErr::InvalidParam {
                name: "n_jobs",
                reason: "must be at least 1".into(),
            });
        }

        self.tree.validate()
    }
}

/// A bagged ensemble of regression trees whose predictions are averaged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits a forest on every row of `dataset`.
    ///
    /// A seed is drawn for every tree up front, so the fitted forest only
    /// depends on `params.seed`, never on `params.n_jobs`.
    ///
    /// # Returns
    /// An error if the parameters are invalid or the thread pool cannot be built.
    pub fn fit(dataset: &Dataset, params: ForestParams) -> Result<Self> {
        params.validate()?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| rng.random()).collect();

        info!(
            "fitting {} trees on {} samples with {} job(s)",
            params.n_estimators,
            dataset.len(),
            params.n_jobs
        );

        let trees = if params.n_jobs == 1 {
            seeds
                .iter()
                .map(|&seed| fit_tree(dataset, &params, seed))
                .collect::<Result<Vec<_>>>()?
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(params.n_jobs)
                .build()?;

            pool.install(|| {
                seeds
                    .par_iter()
                    .map(|&seed| fit_tree(dataset, &params, seed))
                    .collect::<Result<Vec<_>>>()
            })?
        };

        Ok(Self {
            params,
            feature_names: dataset.feature_names().to_vec(),
            trees,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Returns the impurity based importance of every feature, summing to 1.
    ///
    /// Trees that are a single leaf carry no information and are skipped.
    /// All zeros if every tree is a single leaf.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.feature_names.len()];
        let grown: Vec<_> = self.trees.iter().filter(|t| t.nodes().len() > 1).collect();

        for tree in &grown {
            importances
                .iter_mut()
                .zip(tree.feature_importances())
                .for_each(|(acc, v)| *acc += v);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        importances
    }

    /// Checks a deserialized forest is usable for prediction.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ForestErr::InvalidModel("forest has no trees".into()));
        }

        if self.feature_names.is_empty() {
            return Err(ForestErr::InvalidModel("forest has no features".into()));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.feature_names.len() {
                return Err(ForestErr::InvalidModel(format!(
                    "tree {i} expects {} features, forest has {}",
                    tree.n_features(),
                    self.feature_names.len()
                )));
            }

            tree.validate()?;
        }

        Ok(())
    }
}

impl Regressor for RandomForest {
    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }

        Ok(sum / self.trees.len() as f64)
    }
}

fn fit_tree(dataset: &Dataset, params: &ForestParams, seed: u64) -> Result<DecisionTree> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = dataset.len();

    let rows: Vec<usize> = if params.bootstrap {
        (0..n).map(|_| rng.random_range(0..n)).collect()
    } else {
        (0..n).collect()
    };

    let tree = DecisionTree::fit(
        dataset.features(),
        dataset.targets(),
        &rows,
        &params.tree,
        &mut rng,
    )?;

    debug!(
        "tree seeded {seed}: {} nodes, depth {}",
        tree.nodes().len(),
        tree.depth()
    );

    Ok(tree)
}
