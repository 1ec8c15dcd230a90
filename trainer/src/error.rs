use std::{error::Error, fmt};

use forest::ForestErr;

/// The trainer module's result type.
pub type Result<T> = std::result::Result<T, TrainerErr>;

/// Training pipeline failures.
#[derive(Debug)]
pub enum TrainerErr {
    InvalidVar {
        key: &'static str,
        value: String,
        reason: String,
    },
    FeatureMismatch {
        got: Vec<String>,
    },
    Forest(ForestErr),
}

impl fmt::Display for TrainerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainerErr::InvalidVar { key, value, reason } => {
                write!(f, "invalid value {value:?} for {key}: {reason}")
            }
            TrainerErr::FeatureMismatch { got } => write!(
                f,
                "dataset features {got:?} do not match the expected {:?}",
                forest::FEATURE_NAMES
            ),
            TrainerErr::Forest(e) => write!(f, "{e}"),
        }
    }
}

impl Error for TrainerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainerErr::Forest(e) => e.source(),
            _ => None,
        }
    }
}

impl From<ForestErr> for TrainerErr {
    fn from(value: ForestErr) -> Self {
        Self::Forest(value)
    }
}
