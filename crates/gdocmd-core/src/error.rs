//! Error types for gdocmd-core

use gdocs_client::{DocumentId, RemoteError};
use std::path::PathBuf;
use thiserror::Error;

/// The external converter failed
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to launch converter `{program}`: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("Converter exited with {status}: {diagnostic}")]
    Failed { status: String, diagnostic: String },

    #[error("Converter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("Document has no content to split")]
    EmptyDocument,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkerError {
    #[error("Unreadable document id marker on line {line}: {text}")]
    Ambiguous { line: usize, text: String },
}

/// Errors from exporting a remote document to Markdown
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Document has no tab named {0:?}")]
    TabNotFound(String),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from publishing a Markdown file
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(
        "Document {id} recorded in the source no longer exists; refusing to create a replacement (publish with --new to detach)"
    )]
    TargetMissing { id: DocumentId },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Result type for publish operations
pub type PublishResult<T> = std::result::Result<T, PublishError>;
