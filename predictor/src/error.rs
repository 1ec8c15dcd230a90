use std::{error::Error, fmt, io, path::PathBuf};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use forest::ForestErr;
use serde_json::json;

/// The predictor module's result type.
pub type Result<T> = std::result::Result<T, PredictorErr>;

/// Predictor service failures.
#[derive(Debug)]
pub enum PredictorErr {
    Io(io::Error),
    InvalidVar {
        key: &'static str,
        value: String,
    },
    ModelLoad {
        path: PathBuf,
        source: ForestErr,
    },
    IncompatibleModel {
        features: Vec<String>,
    },
    /// The request payload is not a valid feature record.
    InvalidInput(String),
    Prediction(ForestErr),
}

impl fmt::Display for PredictorErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorErr::Io(e) => write!(f, "io error: {e}"),
            PredictorErr::InvalidVar { key, value } => {
                write!(f, "invalid value {value:?} for {key}")
            }
            PredictorErr::ModelLoad { path, .. } => {
                write!(f, "failed to load model from {}", path.display())
            }
            PredictorErr::IncompatibleModel { features } => write!(
                f,
                "model was trained on {features:?}, expected {:?}",
                forest::FEATURE_NAMES
            ),
            PredictorErr::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            PredictorErr::Prediction(_) => write!(f, "prediction failed"),
        }
    }
}

impl Error for PredictorErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PredictorErr::Io(e) => Some(e),
            PredictorErr::ModelLoad { source, .. } => Some(source),
            PredictorErr::Prediction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PredictorErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for the binary.
impl From<PredictorErr> for io::Error {
    fn from(value: PredictorErr) -> Self {
        match value {
            PredictorErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

impl ResponseError for PredictorErr {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictorErr::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain<'a>(err: &'a (dyn Error + 'a)) -> Vec<String> {
        std::iter::successors(Some(err), |e: &&'a (dyn Error + 'a)| (*e).source())
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn model_load_cause_is_reported_once() {
        let err = PredictorErr::ModelLoad {
            path: PathBuf::from("model.json"),
            source: ForestErr::Io(io::Error::new(io::ErrorKind::NotFound, "missing")),
        };

        assert_eq!(
            chain(&err),
            [
                "failed to load model from model.json",
                "io error: missing",
                "missing"
            ]
        );
    }

    #[test]
    fn invalid_input_is_a_bad_request() {
        let err = PredictorErr::InvalidInput("missing field `bmi`".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = PredictorErr::Prediction(ForestErr::EmptyInput("row"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(chain(&err), ["prediction failed", "row must not be empty"]);
    }
}
