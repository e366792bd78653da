//! gdocmd-folder: Folder-level export of remote documents to Markdown
//!
//! This crate provides:
//! - Folder listing with retry
//! - Batch export over a bounded worker pool, one file per document
//!
//! Documents are exported independently; the only state shared between
//! workers is the [`BackoffGate`], so one rate limit pauses every worker.

use gdocmd_blocks::WriterOptions;
use gdocmd_core::{BackoffGate, ExportError, Exporter, RetryPolicy, SlugAllocator, WriteStatus};
use gdocs_client::{DocumentEntry, DocumentService, FolderId, FolderService, RemoteError};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors that abort a whole folder operation
#[derive(Debug, thiserror::Error)]
pub enum FolderError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for folder operations
pub type Result<T> = std::result::Result<T, FolderError>;

/// Options for folder export
#[derive(Debug, Clone, Default)]
pub struct FolderExportOptions {
    /// Output directory for Markdown files
    pub output_dir: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Number of parallel jobs (None = use all CPUs)
    pub parallel_jobs: Option<usize>,
    pub writer: WriterOptions,
    pub retry: RetryPolicy,
    /// Shared with every other caller of the same service
    pub gate: Arc<BackoffGate>,
}

/// Result of a folder export
#[derive(Debug, Default)]
pub struct FolderExportResult {
    /// Number of documents in the folder
    pub total: usize,
    pub exported: Vec<(DocumentEntry, PathBuf)>,
    /// Target file already existed
    pub skipped: Vec<(DocumentEntry, PathBuf)>,
    pub failed: Vec<(DocumentEntry, String)>,
}

impl FolderExportResult {
    pub fn success_count(&self) -> usize {
        self.exported.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// One-line summary, e.g. `Exported 3/4 document(s)`
    pub fn summary(&self) -> String {
        format!("Exported {}/{} document(s)", self.success_count(), self.total)
    }
}

/// Outcome of exporting a single document
enum ExportOutcome {
    Exported(PathBuf),
    Skipped(PathBuf),
    Failed(String),
}

/// List the documents in a folder, retrying on rate limits
pub fn list_folder(
    service: &dyn FolderService,
    folder: &FolderId,
    retry: &RetryPolicy,
    gate: &BackoffGate,
) -> Result<Vec<DocumentEntry>> {
    let (entries, _) = retry.run("list folder", gate, || service.list_documents(folder))?;
    log::info!("Found {} document(s) in folder {}", entries.len(), folder);
    Ok(entries)
}

/// Export every listed document to `<output_dir>/<slug(name)>.md`.
///
/// Per-document failures are collected rather than aborting the batch.
/// Documents sharing a name get distinct files (`-2`, `-3`, ...) in listing
/// order.
pub fn export_folder(
    service: &dyn DocumentService,
    entries: &[DocumentEntry],
    options: &FolderExportOptions,
) -> Result<FolderExportResult> {
    fs::create_dir_all(&options.output_dir)?;

    let mut slugs = SlugAllocator::new();
    let jobs: Vec<(&DocumentEntry, PathBuf)> = entries
        .iter()
        .map(|entry| {
            let file = format!("{}.md", slugs.allocate(&entry.name));
            (entry, options.output_dir.join(file))
        })
        .collect();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = options.parallel_jobs {
        builder = builder.num_threads(n);
    }
    let pool = builder.build()?;

    let outcomes: Vec<ExportOutcome> = pool.install(|| {
        jobs.par_iter()
            .map(|(entry, path)| export_one(service, entry, path.clone(), options))
            .collect()
    });

    let mut result = FolderExportResult {
        total: entries.len(),
        ..Default::default()
    };
    for ((entry, _), outcome) in jobs.into_iter().zip(outcomes) {
        match outcome {
            ExportOutcome::Exported(path) => result.exported.push((entry.clone(), path)),
            ExportOutcome::Skipped(path) => result.skipped.push((entry.clone(), path)),
            ExportOutcome::Failed(msg) => result.failed.push((entry.clone(), msg)),
        }
    }
    Ok(result)
}

fn export_one(
    service: &dyn DocumentService,
    entry: &DocumentEntry,
    path: PathBuf,
    options: &FolderExportOptions,
) -> ExportOutcome {
    let exporter = Exporter::new(service, &options.gate).with_retry(options.retry.clone());
    match exporter.export_to_file(&entry.id, &path, &options.writer, options.force) {
        Ok(WriteStatus::Written) => {
            log::info!("Exported: {} -> {}", entry.name, path.display());
            ExportOutcome::Exported(path)
        }
        Ok(WriteStatus::Skipped) => {
            log::warn!(
                "Skipping '{}': {} exists (use --force to overwrite)",
                entry.name,
                path.display()
            );
            ExportOutcome::Skipped(path)
        }
        Err(err) => {
            let msg = describe(&err);
            log::error!("Failed to export '{}': {}", entry.name, msg);
            ExportOutcome::Failed(msg)
        }
    }
}

fn describe(err: &ExportError) -> String {
    match err {
        ExportError::Remote(RemoteError::NotFound(_)) => "document not found".to_string(),
        ExportError::Remote(RemoteError::PermissionDenied(_)) => "permission denied".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdocs_client::{CreatedDocument, DocumentId, PresentationCommand, RemoteDocument};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    struct FakeDrive {
        docs: HashMap<String, serde_json::Value>,
        listing: Vec<DocumentEntry>,
        list_failures: Mutex<Vec<RemoteError>>,
    }

    impl FakeDrive {
        fn new(docs: &[(&str, &str, &str)]) -> Self {
            let listing = docs
                .iter()
                .map(|(id, name, _)| DocumentEntry {
                    id: DocumentId::parse(id).unwrap(),
                    name: name.to_string(),
                })
                .collect();
            let docs = docs
                .iter()
                .filter(|(_, _, text)| !text.is_empty())
                .map(|(id, name, text)| {
                    let doc = serde_json::json!({
                        "title": name,
                        "body": {"content": [
                            {"paragraph": {"elements": [{"textRun": {"content": format!("{}\n", text)}}]}}
                        ]}
                    });
                    (id.to_string(), doc)
                })
                .collect();
            Self {
                docs,
                listing,
                list_failures: Mutex::new(Vec::new()),
            }
        }
    }

    impl DocumentService for FakeDrive {
        fn get_document(&self, id: &DocumentId) -> gdocs_client::Result<RemoteDocument> {
            match self.docs.get(id.as_str()) {
                Some(doc) => Ok(serde_json::from_value(doc.clone()).unwrap()),
                None => Err(RemoteError::NotFound(id.to_string())),
            }
        }
        fn create_document(&self, _: &str, _: &Path, _: Option<&FolderId>) -> gdocs_client::Result<CreatedDocument> {
            unreachable!()
        }
        fn replace_content(&self, _: &DocumentId, _: &Path) -> gdocs_client::Result<()> {
            unreachable!()
        }
        fn batch_update(&self, _: &DocumentId, _: &[PresentationCommand]) -> gdocs_client::Result<()> {
            unreachable!()
        }
    }

    impl FolderService for FakeDrive {
        fn list_documents(&self, _: &FolderId) -> gdocs_client::Result<Vec<DocumentEntry>> {
            if let Some(err) = self.list_failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(self.listing.clone())
        }
    }

    fn options(dir: &Path) -> FolderExportOptions {
        FolderExportOptions {
            output_dir: dir.to_path_buf(),
            parallel_jobs: Some(2),
            retry: RetryPolicy::immediate(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_folder() {
        let drive = FakeDrive::new(&[
            ("a1", "Meeting Notes", "alpha"),
            ("b2", "Roadmap 2026", "beta"),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let result = export_folder(&drive, &drive.listing, &options(dir.path())).unwrap();

        assert_eq!(result.success_count(), 2);
        assert!(!result.has_failures());
        assert_eq!(result.summary(), "Exported 2/2 document(s)");
        assert_eq!(
            fs::read_to_string(dir.path().join("meeting-notes.md")).unwrap(),
            "alpha\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("roadmap-2026.md")).unwrap(),
            "beta\n"
        );
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let drive = FakeDrive::new(&[
            ("a1", "Good", "fine"),
            ("gone", "Deleted Doc", ""),
            ("c3", "Also Good", "ok"),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let result = export_folder(&drive, &drive.listing, &options(dir.path())).unwrap();

        assert_eq!(result.summary(), "Exported 2/3 document(s)");
        assert!(result.has_failures());
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0.name, "Deleted Doc");
        assert_eq!(result.failed[0].1, "document not found");
    }

    #[test]
    fn test_existing_files_skipped_unless_forced() {
        let drive = FakeDrive::new(&[("a1", "Notes", "new content")]);
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "old").unwrap();

        let result = export_folder(&drive, &drive.listing, &options(dir.path())).unwrap();
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.summary(), "Exported 0/1 document(s)");
        assert_eq!(fs::read_to_string(dir.path().join("notes.md")).unwrap(), "old");

        let forced = FolderExportOptions {
            force: true,
            ..options(dir.path())
        };
        let result = export_folder(&drive, &drive.listing, &forced).unwrap();
        assert_eq!(result.success_count(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.md")).unwrap(),
            "new content\n"
        );
    }

    #[test]
    fn test_duplicate_names_get_distinct_files() {
        let drive = FakeDrive::new(&[("a1", "Notes", "first"), ("b2", "Notes", "second")]);
        let dir = tempfile::tempdir().unwrap();

        let result = export_folder(&drive, &drive.listing, &options(dir.path())).unwrap();

        assert_eq!(result.success_count(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("notes.md")).unwrap(), "first\n");
        assert_eq!(fs::read_to_string(dir.path().join("notes-2.md")).unwrap(), "second\n");
    }

    #[test]
    fn test_output_dir_created() {
        let drive = FakeDrive::new(&[("a1", "Doc", "x")]);
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("docs");

        export_folder(&drive, &drive.listing, &options(&nested)).unwrap();
        assert!(nested.join("doc.md").exists());
    }

    #[test]
    fn test_list_folder_retries() {
        let drive = FakeDrive::new(&[("a1", "Doc", "x")]);
        drive
            .list_failures
            .lock()
            .unwrap()
            .push(RemoteError::RateLimited("quota".to_string()));
        let gate = BackoffGate::new();
        let folder = FolderId::parse("f1").unwrap();

        let entries = list_folder(&drive, &folder, &RetryPolicy::immediate(3), &gate).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Doc");
    }

    #[test]
    fn test_list_folder_not_found_is_fatal() {
        struct Missing;
        impl FolderService for Missing {
            fn list_documents(&self, folder: &FolderId) -> gdocs_client::Result<Vec<DocumentEntry>> {
                Err(RemoteError::NotFound(folder.to_string()))
            }
        }
        let gate = BackoffGate::new();
        let folder = FolderId::parse("f1").unwrap();
        let err = list_folder(&Missing, &folder, &RetryPolicy::immediate(3), &gate).unwrap_err();
        assert!(matches!(err, FolderError::Remote(RemoteError::NotFound(_))));
    }
}
