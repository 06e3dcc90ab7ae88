//! Error type for the attribute access layer.

use std::path::PathBuf;

use h5attr_format::FormatError;
use thiserror::Error;

use crate::status::StatusCode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HDF5 format error: {0}")]
    Format(#[from] FormatError),

    #[error("attribute {name} not found at {location}")]
    AttributeNotFound { location: String, name: String },

    #[error("attribute {0} holds no elements")]
    NoData(String),

    #[error("attribute {name} has {elements} elements, expected a scalar")]
    NotScalar { name: String, elements: u64 },

    #[error("value {0} does not fit in a 32-bit integer")]
    OutOfRange(i64),

    #[error("handle for {0} is already closed")]
    HandleClosed(PathBuf),

    #[error("data directory {0} does not exist or is not a directory")]
    DataDir(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path)
        } else {
            Error::Io { path, source }
        }
    }

    /// The status code this failure is reported as.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::FileNotFound(_) => StatusCode::FileNotFound,
            Error::AttributeNotFound { .. } => StatusCode::InvalidParameter,
            Error::NoData(_) => StatusCode::NoData,
            Error::NotScalar { .. } => StatusCode::InvalidValue,
            Error::OutOfRange(_) => StatusCode::OutOfBounds,
            Error::Format(e) => match e {
                FormatError::PathNotFound(_) | FormatError::NotAGroup(_) => {
                    StatusCode::InvalidParameter
                }
                FormatError::TypeMismatch { .. } => StatusCode::InvalidValue,
                _ => StatusCode::Error,
            },
            Error::Io { .. } | Error::HandleClosed(_) | Error::DataDir(_) => StatusCode::Error,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
