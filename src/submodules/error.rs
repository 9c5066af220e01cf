use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlotError>;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: cannot parse {token:?} as a number")]
    MalformedRow { path: PathBuf, line: usize, token: String },

    #[error("{path}:{line}: column {column} requested but the row has {width} columns")]
    ColumnOutOfRange { path: PathBuf, line: usize, column: usize, width: usize },

    #[error("{path}: no data rows")]
    EmptyTable { path: PathBuf },

    #[error("table shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("path template {template:?}: {message}")]
    Template { template: String, message: String },

    #[error("invalid color {0:?}, expected #rrggbb")]
    Color(String),

    #[error("figure {0:?} has no finite points to draw")]
    EmptyFigure(String),

    #[error("output directory {0} does not exist")]
    MissingOutputDir(PathBuf),

    #[error("drawing {path} failed: {message}")]
    Drawing { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error("linear solve failed: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("newton iteration did not converge after {iterations} steps (residual {residual:e})")]
    Convergence { iterations: usize, residual: f64 },
}

impl PlotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlotError::Io { path: path.into(), source }
    }
}
