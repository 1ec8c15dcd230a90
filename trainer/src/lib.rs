pub mod config;
pub mod error;

use std::path::Path;

use forest::{
    persist, train_test_split, Dataset, ForestParams, Metric, Mse, R2, RandomForest, Regressor,
    FEATURE_NAMES,
};
use log::info;

pub use config::TrainerConfig;
pub use error::{Result, TrainerErr};

/// Held-out quality of a fitted forest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mse: f64,
    pub r2: f64,
    pub n_train: usize,
    pub n_test: usize,
}

/// A fitted forest together with its held-out evaluation.
#[derive(Debug)]
pub struct TrainedModel {
    pub forest: RandomForest,
    pub evaluation: Evaluation,
}

impl TrainedModel {
    /// Writes the forest to `path`. The evaluation is not persisted.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save(&self.forest, path)?;
        Ok(())
    }
}

/// Loads the configured dataset and checks it has the diabetes feature columns.
///
/// # Returns
/// An error if the file cannot be read or parsed, or its feature columns
/// differ from `FEATURE_NAMES` (names compared case-insensitively, in order).
pub fn load_dataset(config: &TrainerConfig) -> Result<Dataset> {
    let mut dataset = Dataset::from_path(config.dataset_path())?;

    if dataset.feature_names() != FEATURE_NAMES {
        return Err(TrainerErr::FeatureMismatch {
            got: dataset.feature_names().to_vec(),
        });
    }

    if config.scale() {
        dataset.scale();
    }

    info!(
        "loaded {} samples with {} features from {}",
        dataset.len(),
        dataset.n_features(),
        config.dataset_path().display()
    );

    Ok(dataset)
}

/// Loads the configured dataset, then splits, fits and evaluates.
pub fn fit(config: &TrainerConfig) -> Result<TrainedModel> {
    let dataset = load_dataset(config)?;
    fit_dataset(&dataset, config.test_size(), config.params())
}

/// Splits `dataset`, fits a forest on the train rows and evaluates it on the test rows.
///
/// # Arguments
/// * `dataset` - The full dataset.
/// * `test_size` - Fraction of rows held out for evaluation.
/// * `params` - The forest hyperparameters. Its seed also drives the split.
pub fn fit_dataset(
    dataset: &Dataset,
    test_size: f64,
    params: &ForestParams,
) -> Result<TrainedModel> {
    let split = train_test_split(dataset, test_size, params.seed)?;
    info!(
        "split into {} train and {} test samples",
        split.train.len(),
        split.test.len()
    );

    let forest = RandomForest::fit(&split.train, *params)?;

    let y_pred = forest.predict(split.test.features())?;
    let y_true = split.test.targets();
    let evaluation = Evaluation {
        mse: Mse.compute(y_true, &y_pred)?,
        r2: R2.compute(y_true, &y_pred)?,
        n_train: split.train.len(),
        n_test: split.test.len(),
    };

    info!(
        "{}={:.4} {}={:.4}",
        Mse.name(),
        evaluation.mse,
        R2.name(),
        evaluation.r2
    );

    for (name, importance) in forest
        .feature_names()
        .iter()
        .zip(forest.feature_importances())
    {
        info!("importance of {name}: {importance:.4}");
    }

    Ok(TrainedModel { forest, evaluation })
}
