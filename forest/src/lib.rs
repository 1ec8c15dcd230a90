mod dataset;
mod ensemble;
mod error;
mod metrics;
mod model;
pub mod persist;
mod split;
mod tree;

pub use dataset::{Dataset, FEATURE_NAMES};
pub use ensemble::{ForestParams, RandomForest};
pub use error::{ForestErr, Result};
pub use metrics::{Metric, Mse, R2};
pub use model::Regressor;
pub use split::{train_test_split, TrainTestSplit};
pub use tree::{DecisionTree, Node, TreeParams};
