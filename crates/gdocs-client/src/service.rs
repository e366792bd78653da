//! Service traits over the remote document and folder APIs
//!
//! The core only talks to these traits, so tests can drive it with in-memory
//! fakes and the CLI can plug in [`crate::GoogleClient`].

use crate::commands::PresentationCommand;
use crate::error::Result;
use crate::ids::{DocumentId, FolderId};
use crate::model::RemoteDocument;
use std::path::Path;

/// A document created from an uploaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDocument {
    pub id: DocumentId,
    /// Browser URL, when the service reports one
    pub url: Option<String>,
}

/// One entry of a folder listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub id: DocumentId,
    pub name: String,
}

/// Remote document operations
pub trait DocumentService: Send + Sync {
    /// Fetch the full structural representation of a document, all tabs included
    fn get_document(&self, id: &DocumentId) -> Result<RemoteDocument>;

    /// Create a native document from a `.docx` artifact
    fn create_document(
        &self,
        title: &str,
        artifact: &Path,
        folder: Option<&FolderId>,
    ) -> Result<CreatedDocument>;

    /// Replace the whole content of an existing document with a `.docx` artifact.
    ///
    /// The replacement is atomic on the service side: the document either has
    /// the new content afterwards or keeps the old one.
    fn replace_content(&self, id: &DocumentId, artifact: &Path) -> Result<()>;

    /// Apply a batch of presentation commands in order
    fn batch_update(&self, id: &DocumentId, commands: &[PresentationCommand]) -> Result<()>;
}

/// Remote folder listing
pub trait FolderService: Send + Sync {
    /// All documents directly inside the folder, ordered by name
    fn list_documents(&self, folder: &FolderId) -> Result<Vec<DocumentEntry>>;
}
