use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use forest::{ForestParams, TreeParams};

use crate::{Result, TrainerErr};

pub const DEFAULT_DATASET_PATH: &str = "data/diabetes.csv";
pub const DEFAULT_MODEL_PATH: &str = "diabetes_model.json";
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Immutable settings of a training run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    dataset_path: PathBuf,
    scale: bool,
    model_path: PathBuf,
    test_size: f64,
    params: ForestParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            dataset_path: DEFAULT_DATASET_PATH.into(),
            scale: false,
            model_path: DEFAULT_MODEL_PATH.into(),
            test_size: DEFAULT_TEST_SIZE,
            params: ForestParams::default(),
        }
    }
}

impl TrainerConfig {
    /// Creates a new trainer configuration.
    ///
    /// # Args
    /// * `dataset_path` - The delimited text file to train on.
    /// * `model_path` - Where the fitted model is written.
    ///
    /// # Returns
    /// A `TrainerConfig` with the default split and forest parameters.
    pub fn new(dataset_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// Recognized variables: `DATASET_PATH`, `DATASET_SCALE`, `MODEL_PATH`,
    /// `TEST_SIZE`, `SEED`, `N_ESTIMATORS`, `MAX_DEPTH`, `N_JOBS`.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value if set.
    ///
    /// # Returns
    /// An error if a set variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_depth = match lookup("MAX_DEPTH") {
            Some(value) => Some(parse("MAX_DEPTH", &value)?),
            None => defaults.params.tree.max_depth,
        };

        let params = ForestParams {
            n_estimators: var(&lookup, "N_ESTIMATORS", defaults.params.n_estimators)?,
            seed: var(&lookup, "SEED", defaults.params.seed)?,
            n_jobs: var(&lookup, "N_JOBS", defaults.params.n_jobs)?,
            tree: TreeParams {
                max_depth,
                ..defaults.params.tree
            },
            ..defaults.params
        };

        Ok(Self {
            dataset_path: lookup("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_path),
            scale: flag(&lookup, "DATASET_SCALE", defaults.scale)?,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            test_size: var(&lookup, "TEST_SIZE", defaults.test_size)?,
            params,
        })
    }

    pub fn with_params(mut self, params: ForestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn dataset_path(&self) -> &PathBuf {
        &self.dataset_path
    }

    /// Whether feature columns are centred and scaled to unit norm after loading.
    pub fn scale(&self) -> bool {
        self.scale
    }

    pub fn model_path(&self) -> &PathBuf {
        &self.model_path
    }

    pub fn test_size(&self) -> f64 {
        self.test_size
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| TrainerErr::InvalidVar {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key).map_or(Ok(default), |value| parse(key, &value))
}

fn flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(TrainerErr::InvalidVar {
            key,
            value,
            reason: "expected a boolean".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_reference_run() {
        let config = TrainerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.dataset_path(), &PathBuf::from("data/diabetes.csv"));
        assert_eq!(config.model_path(), &PathBuf::from("diabetes_model.json"));
        assert_eq!(config.test_size(), 0.2);
        assert!(!config.scale());
        assert_eq!(config.params().n_estimators, 100);
        assert_eq!(config.params().seed, 42);
        assert_eq!(config.params().tree.max_depth, None);
    }

    #[test]
    fn variables_override_defaults() {
        let config = TrainerConfig::from_lookup(lookup(&[
            ("N_ESTIMATORS", "10"),
            ("MAX_DEPTH", "4"),
            ("N_JOBS", "2"),
            ("DATASET_SCALE", "true"),
            ("MODEL_PATH", "/tmp/m.json"),
        ]))
        .unwrap();

        assert_eq!(config.params().n_estimators, 10);
        assert_eq!(config.params().tree.max_depth, Some(4));
        assert_eq!(config.params().n_jobs, 2);
        assert!(config.scale());
        assert_eq!(config.model_path(), &PathBuf::from("/tmp/m.json"));
    }

    #[test]
    fn unparsable_variable_is_an_error() {
        let res = TrainerConfig::from_lookup(lookup(&[("SEED", "forty-two")]));
        assert!(matches!(res, Err(TrainerErr::InvalidVar { key: "SEED", .. })));

        let res = TrainerConfig::from_lookup(lookup(&[("DATASET_SCALE", "maybe")]));
        assert!(matches!(
            res,
            Err(TrainerErr::InvalidVar {
                key: "DATASET_SCALE",
                ..
            })
        ));
    }
}
