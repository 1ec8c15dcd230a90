use std::{env, num::NonZeroUsize, path::PathBuf, str::FromStr};

use crate::{PredictorErr, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL_PATH: &str = "diabetes_model.json";

/// Immutable settings of the predictor service.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    host: String,
    port: u16,
    model_path: PathBuf,
    workers: Option<NonZeroUsize>,
}

impl PredictorConfig {
    /// Reads the configuration from `HOST`, `PORT`, `MODEL_PATH` and `WORKERS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value if set.
    ///
    /// # Returns
    /// An error if `PORT` or `WORKERS` is set but not a valid number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => parse("PORT", value)?,
            None => DEFAULT_PORT,
        };

        let workers = match lookup("WORKERS") {
            Some(value) => Some(parse("WORKERS", value)?),
            None => None,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            workers,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_path(&self) -> &PathBuf {
        &self.model_path
    }

    /// Number of HTTP workers, actix-web's default (one per core) when `None`.
    pub fn workers(&self) -> Option<NonZeroUsize> {
        self.workers
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T> {
    let parsed: std::result::Result<T, _> = value.trim().parse();
    parsed.map_err(|_| PredictorErr::InvalidVar { key, value })
}
