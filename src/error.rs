use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open document '{path}': {source}")]
    DocumentUnreadable {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write dataset '{path}': {source}")]
    SinkWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write archive '{path}': {source}")]
    ArchiveWriteFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}
