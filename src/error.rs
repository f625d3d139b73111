use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamlinerError {
    #[error("Cannot open source workbook {path}: {details}")]
    SourceOpen { path: PathBuf, details: String },

    #[error("Cannot write destination workbook {path}: {details}")]
    DestinationWrite { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StreamlinerError {
    /// True for the errors that abort a run before any output exists.
    pub fn is_fatal_io(&self) -> bool {
        matches!(
            self,
            StreamlinerError::SourceOpen { .. }
                | StreamlinerError::DestinationWrite { .. }
                | StreamlinerError::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StreamlinerError>;
