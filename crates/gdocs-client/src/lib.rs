//! gdocs-client: remote document service plumbing for gdocmd
//!
//! This crate provides:
//! - The wire model of a remote document (tabs, paragraphs, tables, lists)
//! - The remote error taxonomy with a single retry classification point
//! - `DocumentService` / `FolderService` traits
//! - Presentation commands for `documents.batchUpdate`
//! - A blocking HTTP implementation (`http` feature, on by default)
//!
//! # Example
//!
//! ```
//! use gdocs_client::{DocumentId, RemoteError};
//!
//! let id = DocumentId::parse("https://docs.google.com/document/d/1AbC/edit").unwrap();
//! assert_eq!(id.as_str(), "1AbC");
//!
//! let err = RemoteError::from_status(429, None, "slow down");
//! assert!(err.is_retryable());
//! ```

pub mod commands;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod ids;
pub mod model;
pub mod service;

pub use commands::PresentationCommand;
pub use error::{RemoteError, Result};
#[cfg(feature = "http")]
pub use http::GoogleClient;
pub use ids::{DocumentId, FolderId, IdParseError};
pub use model::{ElementKind, RemoteDocument};
pub use service::{CreatedDocument, DocumentEntry, DocumentService, FolderService};
