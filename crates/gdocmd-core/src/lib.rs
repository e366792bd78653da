//! gdocmd-core: Google Docs to Markdown and back
//!
//! This crate provides:
//! - Structure reading: remote document tree to block sequences
//! - Section splitting by heading level or by tab, with unique slugs
//! - The identity marker linking a Markdown file to its remote document
//! - The publish coordinator (convert, create or update, style)
//! - Single-document export
//!
//! # Example
//!
//! ```
//! use gdocmd_core::marker;
//! use gdocs_client::DocumentId;
//!
//! let id = DocumentId::parse("1AbC_d").unwrap();
//! let text = marker::write("# Notes\n", &id);
//! assert_eq!(text, "<!-- google-doc-id: 1AbC_d -->\n\n# Notes\n");
//! assert_eq!(marker::read(&text).unwrap(), Some(id));
//! ```

pub mod converter;
pub mod error;
pub mod export;
pub mod marker;
pub mod publish;
pub mod reader;
pub mod retry;
pub mod slug;
pub mod split;
pub mod styles;

pub use converter::{Converter, PandocConverter};
pub use error::{
    ConversionError, ExportError, ExportResult, MarkerError, PublishError, PublishResult,
    SplitError,
};
pub use export::{ExportOptions, ExportedFile, Exporter, WriteStatus};
pub use publish::{PublishOptions, PublishOutcome, Publisher, StyleReport};
pub use reader::{ReadDocument, ReadTab, StructureReader};
pub use retry::{BackoffGate, RetryPolicy};
pub use slug::{SlugAllocator, slugify};
pub use split::{Section, SplitMode, split_by_heading, split_by_tabs};
pub use styles::{StyleRole, StyleRules};
