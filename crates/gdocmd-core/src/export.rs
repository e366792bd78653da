//! Remote document to Markdown files

use crate::error::{ExportError, ExportResult, SplitError};
use crate::reader::{ReadDocument, StructureReader};
use crate::retry::{BackoffGate, RetryPolicy};
use crate::slug::slugify;
use crate::split::{Section, SplitMode, split_by_heading, split_by_tabs};
use gdocmd_blocks::{WriterOptions, blocks_to_markdown};
use gdocs_client::{DocumentId, DocumentService};
use std::path::{Path, PathBuf};

/// Options for exporting one document
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Target file (single or heading split) or directory (tab split).
    /// Defaults are derived from the document title.
    pub output: Option<PathBuf>,
    pub split: Option<SplitMode>,
    /// Only export this tab (id or title)
    pub tab: Option<String>,
    /// Overwrite existing files
    pub force: bool,
    pub writer: WriterOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// The file existed and overwriting was not requested
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub status: WriteStatus,
}

/// Fetches documents and writes them as Markdown
pub struct Exporter<'a> {
    service: &'a dyn DocumentService,
    gate: &'a BackoffGate,
    retry: RetryPolicy,
}

impl<'a> Exporter<'a> {
    /// `gate` is shared with every other caller of the same service
    pub fn new(service: &'a dyn DocumentService, gate: &'a BackoffGate) -> Self {
        Self {
            service,
            gate,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read a document, retrying on rate limits and transient failures
    pub fn fetch(&self, id: &DocumentId) -> ExportResult<ReadDocument> {
        let reader = StructureReader::new(self.service);
        let (doc, _) = self
            .retry
            .run("read document", self.gate, || reader.read(id))?;
        Ok(doc)
    }

    /// Export a document according to `options`
    pub fn export(&self, id: &DocumentId, options: &ExportOptions) -> ExportResult<Vec<ExportedFile>> {
        let doc = self.fetch(id)?;
        log::info!("Document: {}", doc.title);
        let doc = select_tab(doc, options.tab.as_deref())?;

        match options.split {
            None => {
                let path = options
                    .output
                    .clone()
                    .unwrap_or_else(|| default_file_name(&doc.title));
                let markdown = blocks_to_markdown(&doc.blocks(), &options.writer);
                write_new(&path, &markdown, options.force)?;
                Ok(vec![ExportedFile {
                    path,
                    status: WriteStatus::Written,
                }])
            }
            Some(SplitMode::Heading(level)) => {
                let markdown = blocks_to_markdown(&doc.blocks(), &options.writer);
                let sections = split_by_heading(&markdown, level)?;
                let dir = heading_split_dir(options.output.as_deref());
                write_sections(&dir, &sections, options.force)
            }
            Some(SplitMode::Tabs) => {
                let rendered: Vec<(&str, String)> = doc
                    .tabs
                    .iter()
                    .map(|tab| {
                        (
                            tab.title.as_str(),
                            blocks_to_markdown(&tab.blocks, &options.writer),
                        )
                    })
                    .collect();
                let sections = split_by_tabs(rendered)?;
                let dir = tab_split_dir(options.output.as_deref(), &doc.title);
                write_sections(&dir, &sections, options.force)
            }
        }
    }

    /// Export the whole document to `path`, skipping it if it exists.
    ///
    /// Existence is checked before any remote call.
    pub fn export_to_file(
        &self,
        id: &DocumentId,
        path: &Path,
        writer: &WriterOptions,
        force: bool,
    ) -> ExportResult<WriteStatus> {
        if path.exists() && !force {
            return Ok(WriteStatus::Skipped);
        }
        let doc = self.fetch(id)?;
        let markdown = blocks_to_markdown(&doc.blocks(), writer);
        write_file(path, &markdown)?;
        Ok(WriteStatus::Written)
    }
}

/// Keep only the requested tab
fn select_tab(mut doc: ReadDocument, tab: Option<&str>) -> ExportResult<ReadDocument> {
    let Some(key) = tab else {
        return Ok(doc);
    };
    let selected = doc
        .tab(key)
        .cloned()
        .ok_or_else(|| ExportError::TabNotFound(key.to_string()))?;
    doc.tabs = vec![selected];
    Ok(doc)
}

/// `<slug(title)>.md` in the current directory
pub fn default_file_name(title: &str) -> PathBuf {
    PathBuf::from(format!("{}.md", slugify(title)))
}

/// Sections of a heading split are written next to the output file
fn heading_split_dir(output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => PathBuf::from("."),
    }
}

/// Tab splits go into a directory: the output stem for `x.md`, the output
/// itself otherwise, or the title slug by default
fn tab_split_dir(output: Option<&Path>, title: &str) -> PathBuf {
    match output {
        Some(path) if path.extension().is_some_and(|ext| ext == "md") => path.with_extension(""),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(slugify(title)),
    }
}

fn write_sections(dir: &Path, sections: &[Section], force: bool) -> ExportResult<Vec<ExportedFile>> {
    if sections.is_empty() {
        return Err(SplitError::EmptyDocument.into());
    }
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::with_capacity(sections.len());
    for section in sections {
        let path = dir.join(format!("{}.md", section.slug));
        let status = if path.exists() && !force {
            log::warn!("Skipping {}: file exists (use --force to overwrite)", path.display());
            WriteStatus::Skipped
        } else {
            write_file(&path, &section.content)?;
            WriteStatus::Written
        };
        files.push(ExportedFile { path, status });
    }
    Ok(files)
}

/// Write a single-file export, refusing to overwrite unless forced
fn write_new(path: &Path, content: &str, force: bool) -> ExportResult<()> {
    if path.exists() && !force {
        return Err(ExportError::AlreadyExists(path.to_path_buf()));
    }
    write_file(path, content)
}

fn write_file(path: &Path, content: &str) -> ExportResult<()> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdocs_client::{CreatedDocument, FolderId, PresentationCommand, RemoteDocument, RemoteError, Result};
    use serde_json::json;
    use std::sync::Mutex;

    struct FakeDocs {
        doc: serde_json::Value,
        failures: Mutex<Vec<RemoteError>>,
    }

    impl FakeDocs {
        fn new(doc: serde_json::Value) -> Self {
            Self {
                doc,
                failures: Mutex::new(Vec::new()),
            }
        }
    }

    impl DocumentService for FakeDocs {
        fn get_document(&self, _: &DocumentId) -> Result<RemoteDocument> {
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(serde_json::from_value(self.doc.clone()).unwrap())
        }
        fn create_document(&self, _: &str, _: &Path, _: Option<&FolderId>) -> Result<CreatedDocument> {
            unreachable!()
        }
        fn replace_content(&self, _: &DocumentId, _: &Path) -> Result<()> {
            unreachable!()
        }
        fn batch_update(&self, _: &DocumentId, _: &[PresentationCommand]) -> Result<()> {
            unreachable!()
        }
    }

    fn para(text: &str, style: &str) -> serde_json::Value {
        json!({"paragraph": {
            "paragraphStyle": {"namedStyleType": style},
            "elements": [{"textRun": {"content": format!("{}\n", text)}}]
        }})
    }

    fn sectioned() -> serde_json::Value {
        json!({
            "title": "Team Plan",
            "body": {"content": [
                para("Overview text", "NORMAL_TEXT"),
                para("Q1 2026: Rocks & Goals", "HEADING_1"),
                para("First", "NORMAL_TEXT"),
                para("Q1 2026: Rocks & Goals", "HEADING_1"),
                para("Second", "NORMAL_TEXT")
            ]}
        })
    }

    fn tabbed() -> serde_json::Value {
        json!({
            "title": "Handbook",
            "tabs": [
                {"tabProperties": {"tabId": "t.0", "title": "Getting Started"},
                 "documentTab": {"body": {"content": [para("Welcome", "NORMAL_TEXT")]}}},
                {"tabProperties": {"tabId": "t.1", "title": "Empty"},
                 "documentTab": {"body": {"content": []}}},
                {"tabProperties": {"tabId": "t.2", "title": "FAQ"},
                 "documentTab": {"body": {"content": [para("Ask", "NORMAL_TEXT")]}}}
            ]
        })
    }

    fn id() -> DocumentId {
        DocumentId::parse("doc-1").unwrap()
    }

    #[test]
    fn test_single_export_and_overwrite_policy() {
        let service = FakeDocs::new(sectioned());
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plan.md");
        let options = ExportOptions {
            output: Some(out.clone()),
            ..Default::default()
        };

        let files = exporter.export(&id(), &options).unwrap();
        assert_eq!(files[0].status, WriteStatus::Written);
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("Overview text\n\n# Q1 2026: Rocks & Goals\n"));

        let err = exporter.export(&id(), &options).unwrap_err();
        assert!(matches!(err, ExportError::AlreadyExists(_)));

        let forced = ExportOptions {
            force: true,
            ..options
        };
        assert!(exporter.export(&id(), &forced).is_ok());
    }

    #[test]
    fn test_heading_split_writes_next_to_output() {
        let service = FakeDocs::new(sectioned());
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            output: Some(dir.path().join("plan.md")),
            split: Some(SplitMode::Heading(1)),
            ..Default::default()
        };

        let files = exporter.export(&id(), &options).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "introduction.md",
                "q1-2026-rocks-goals.md",
                "q1-2026-rocks-goals-2.md"
            ]
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("q1-2026-rocks-goals-2.md")).unwrap(),
            "# Q1 2026: Rocks & Goals\n\nSecond\n"
        );
    }

    #[test]
    fn test_split_skips_existing_files() {
        let service = FakeDocs::new(sectioned());
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("introduction.md"), "keep me").unwrap();
        let options = ExportOptions {
            output: Some(dir.path().to_path_buf()),
            split: Some(SplitMode::Heading(1)),
            ..Default::default()
        };

        let files = exporter.export(&id(), &options).unwrap();
        assert_eq!(files[0].status, WriteStatus::Skipped);
        assert_eq!(files[1].status, WriteStatus::Written);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("introduction.md")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_tab_split_into_directory() {
        let service = FakeDocs::new(tabbed());
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            output: Some(dir.path().join("handbook.md")),
            split: Some(SplitMode::Tabs),
            ..Default::default()
        };

        let files = exporter.export(&id(), &options).unwrap();
        let target = dir.path().join("handbook");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, target.join("getting-started.md"));
        assert_eq!(files[1].path, target.join("faq.md"));
        assert_eq!(std::fs::read_to_string(&files[1].path).unwrap(), "Ask\n");
    }

    #[test]
    fn test_single_tab_export() {
        let service = FakeDocs::new(tabbed());
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("faq.md");
        let options = ExportOptions {
            output: Some(out.clone()),
            tab: Some("FAQ".to_string()),
            ..Default::default()
        };
        exporter.export(&id(), &options).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "Ask\n");

        let missing = ExportOptions {
            tab: Some("Nope".to_string()),
            force: true,
            ..options
        };
        assert!(matches!(
            exporter.export(&id(), &missing),
            Err(ExportError::TabNotFound(_))
        ));
    }

    #[test]
    fn test_empty_document_cannot_be_split() {
        let service = FakeDocs::new(json!({"title": "Blank", "body": {"content": []}}));
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            output: Some(dir.path().join("blank.md")),
            split: Some(SplitMode::Heading(2)),
            ..Default::default()
        };
        assert!(matches!(
            exporter.export(&id(), &options),
            Err(ExportError::Split(SplitError::EmptyDocument))
        ));
    }

    #[test]
    fn test_fetch_retries_transient_failures() {
        let service = FakeDocs::new(sectioned());
        service
            .failures
            .lock()
            .unwrap()
            .push(RemoteError::Transient("502".to_string()));
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate).with_retry(RetryPolicy::immediate(3));
        let doc = exporter.fetch(&id()).unwrap();
        assert_eq!(doc.title, "Team Plan");
    }

    #[test]
    fn test_export_to_file_skips_existing() {
        let service = FakeDocs::new(sectioned());
        service
            .failures
            .lock()
            .unwrap()
            .push(RemoteError::NotFound("never fetched".to_string()));
        let gate = BackoffGate::new();
        let exporter = Exporter::new(&service, &gate);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.md");
        std::fs::write(&path, "old").unwrap();

        let status = exporter
            .export_to_file(&id(), &path, &WriterOptions::default(), false)
            .unwrap();
        assert_eq!(status, WriteStatus::Skipped);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_default_paths() {
        assert_eq!(default_file_name("Team Plan"), PathBuf::from("team-plan.md"));
        assert_eq!(tab_split_dir(None, "Team Plan"), PathBuf::from("team-plan"));
        assert_eq!(
            tab_split_dir(Some(Path::new("out/dir")), "x"),
            PathBuf::from("out/dir")
        );
        assert_eq!(heading_split_dir(Some(Path::new("notes.md"))), PathBuf::from("."));
    }
}
