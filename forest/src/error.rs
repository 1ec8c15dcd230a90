use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire forest crate.
pub type Result<T> = std::result::Result<T, ForestErr>;

/// The forest crate's error type.
#[derive(Debug)]
pub enum ForestErr {
    Io(io::Error),
    Json(serde_json::Error),
    ThreadPool(rayon::ThreadPoolBuildError),
    Parse {
        line: usize,
        msg: String,
    },
    EmptyInput(&'static str),
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidParam {
        name: &'static str,
        reason: String,
    },
    InvalidModel(String),
}

impl Display for ForestErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestErr::Io(e) => write!(f, "io error: {e}"),
            ForestErr::Json(e) => write!(f, "json error: {e}"),
            ForestErr::ThreadPool(e) => write!(f, "failed to build thread pool: {e}"),
            ForestErr::Parse { line, msg } => write!(f, "dataset line {line}: {msg}"),
            ForestErr::EmptyInput(what) => write!(f, "{what} must not be empty"),
            ForestErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            ForestErr::InvalidParam { name, reason } => {
                write!(f, "invalid parameter {name}: {reason}")
            }
            ForestErr::InvalidModel(msg) => write!(f, "invalid model: {msg}"),
        }
    }
}

impl Error for ForestErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ForestErr::Io(e) => Some(e),
            ForestErr::Json(e) => Some(e),
            ForestErr::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ForestErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ForestErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<rayon::ThreadPoolBuildError> for ForestErr {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(value)
    }
}
