//! Error types for fpn-inp

use std::path::PathBuf;

use thiserror::Error;

use crate::keyword::Keyword;

pub type Result<T> = std::result::Result<T, FpnError>;

/// Fatal errors. Any of these aborts the pass that raised it.
#[derive(Error, Debug)]
pub enum FpnError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FpnError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FpnError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single line that could not be turned into a record.
///
/// Decode failures are recoverable: the line is logged and skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{keyword}: {message}")]
pub struct DecodeError {
    pub keyword: Keyword,
    pub message: String,
}

impl DecodeError {
    pub fn new(keyword: Keyword, message: impl Into<String>) -> Self {
        Self {
            keyword,
            message: message.into(),
        }
    }
}
