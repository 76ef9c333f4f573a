//! Error types for fpn-io

use std::path::PathBuf;

use thiserror::Error;

use fpn_inp::Id;

pub type Result<T> = std::result::Result<T, ProjectionError>;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("stage {0} does not exist")]
    UnknownStage(Id),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to format MDPA output")]
    Format(#[from] std::fmt::Error),
}

impl ProjectionError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectionError::Io {
            path: path.into(),
            source,
        }
    }
}
