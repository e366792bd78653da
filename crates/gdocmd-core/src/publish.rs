//! Publish coordinator
//!
//! One publish runs as an explicit state machine:
//!
//! ```text
//! Start -> Convert -> Create | Update -> Style -> Done
//! ```
//!
//! Content and presentation are separate phases. Styling always works from a
//! fresh read of the uploaded document and never fails the publish.

use crate::converter::Converter;
use crate::error::{PublishError, PublishResult};
use crate::marker;
use crate::retry::{BackoffGate, RetryPolicy};
use crate::styles::{StyleRole, StyleRules};
use gdocs_client::{DocumentId, DocumentService, FolderId, RemoteError};
use std::path::{Path, PathBuf};

/// File name of the intermediate artifact inside the work directory
const ARTIFACT_NAME: &str = "upload.docx";

/// Options for one publish
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub title: String,
    /// Folder for newly created documents
    pub folder: Option<FolderId>,
    pub reference_doc: Option<PathBuf>,
    /// Ignore a recorded document id and create a new document
    pub force_new: bool,
    /// Save the artifact next to the source as `<input>.docx`
    pub keep_artifact: bool,
    /// Do not record the document id in the source file
    pub no_save_id: bool,
}

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub document_id: DocumentId,
    pub url: String,
    /// A new document was created rather than an existing one updated
    pub created: bool,
    /// Attempts needed for the content upload
    pub upload_attempts: u32,
    pub style_report: StyleReport,
}

/// What the presentation phase managed to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleReport {
    /// Roles applied, with their command counts
    pub applied: Vec<(StyleRole, usize)>,
    /// Roles skipped, with the reason
    pub failed: Vec<(StyleRole, String)>,
}

impl StyleReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
enum PublishState {
    Start,
    Convert { target: Option<DocumentId> },
    Create,
    Update { id: DocumentId },
    Style {
        id: DocumentId,
        url: Option<String>,
        created: bool,
        upload_attempts: u32,
    },
    Done(PublishOutcome),
}

/// Drives publishes against one document service
pub struct Publisher<'a> {
    service: &'a dyn DocumentService,
    converter: &'a dyn Converter,
    retry: RetryPolicy,
    styles: StyleRules,
    gate: BackoffGate,
}

impl<'a> Publisher<'a> {
    pub fn new(service: &'a dyn DocumentService, converter: &'a dyn Converter) -> Self {
        Self {
            service,
            converter,
            retry: RetryPolicy::default(),
            styles: StyleRules::default(),
            gate: BackoffGate::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_styles(mut self, styles: StyleRules) -> Self {
        self.styles = styles;
        self
    }

    /// Publish a Markdown file and record the document id in it.
    ///
    /// The file is only rewritten after the whole publish succeeded, so a
    /// failure keeps the existing link between file and document.
    pub fn publish_file(&self, path: &Path, options: &PublishOptions) -> PublishResult<PublishOutcome> {
        let io_err = |source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        };
        let text = std::fs::read_to_string(path).map_err(io_err)?;

        let workdir = tempfile::tempdir().map_err(io_err)?;
        let outcome = self.publish(&text, options, workdir.path())?;

        if options.keep_artifact {
            let kept = path.with_extension("docx");
            std::fs::copy(workdir.path().join(ARTIFACT_NAME), &kept).map_err(|source| {
                PublishError::Io {
                    path: kept.clone(),
                    source,
                }
            })?;
            log::info!("Saved artifact to {}", kept.display());
        }

        if !options.no_save_id {
            let updated = marker::write(&text, &outcome.document_id);
            if updated != text {
                std::fs::write(path, updated).map_err(io_err)?;
                log::info!("Recorded document id in {}", path.display());
            }
        }

        Ok(outcome)
    }

    /// Publish Markdown text, using `workdir` for intermediate files
    pub fn publish(&self, markdown: &str, options: &PublishOptions, workdir: &Path) -> PublishResult<PublishOutcome> {
        let artifact = workdir.join(ARTIFACT_NAME);
        let mut state = PublishState::Start;
        loop {
            log::debug!("Publish state: {:?}", state);
            state = match state {
                PublishState::Start => {
                    let recorded = marker::read(markdown)?;
                    let target = match recorded {
                        Some(id) if options.force_new => {
                            log::info!("Ignoring recorded document {} and creating a new one", id);
                            None
                        }
                        other => other,
                    };
                    PublishState::Convert { target }
                }
                PublishState::Convert { target } => {
                    self.converter.markdown_to_artifact(
                        markdown,
                        &artifact,
                        options.reference_doc.as_deref(),
                    )?;
                    match target {
                        Some(id) => PublishState::Update { id },
                        None => PublishState::Create,
                    }
                }
                PublishState::Create => {
                    log::info!("Creating document {:?}", options.title);
                    // Only rejected creates are retried; a create whose
                    // outcome is unknown surfaces as Indeterminate
                    let (created, attempts) = self.retry.run("create document", &self.gate, || {
                        self.service
                            .create_document(&options.title, &artifact, options.folder.as_ref())
                    })?;
                    PublishState::Style {
                        id: created.id,
                        url: created.url,
                        created: true,
                        upload_attempts: attempts,
                    }
                }
                PublishState::Update { id } => {
                    log::info!("Updating document {}", id);
                    let result = self.retry.run("replace content", &self.gate, || {
                        self.service.replace_content(&id, &artifact)
                    });
                    match result {
                        Ok(((), attempts)) => PublishState::Style {
                            id,
                            url: None,
                            created: false,
                            upload_attempts: attempts,
                        },
                        Err(RemoteError::NotFound(_)) => {
                            return Err(PublishError::TargetMissing { id });
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                PublishState::Style {
                    id,
                    url,
                    created,
                    upload_attempts,
                } => {
                    let style_report = self.apply_styles(&id);
                    PublishState::Done(PublishOutcome {
                        url: url.unwrap_or_else(|| id.edit_url()),
                        document_id: id,
                        created,
                        upload_attempts,
                        style_report,
                    })
                }
                PublishState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// Presentation phase: re-read the document and apply each role on its own
    fn apply_styles(&self, id: &DocumentId) -> StyleReport {
        let mut report = StyleReport::default();
        let doc = match self
            .retry
            .run("read uploaded document", &self.gate, || self.service.get_document(id))
        {
            Ok((doc, _)) => doc,
            Err(err) => {
                log::warn!("Skipping styling: could not read {}: {}", id, err);
                report.failed = StyleRole::ALL
                    .iter()
                    .map(|role| (*role, err.to_string()))
                    .collect();
                return report;
            }
        };

        for role in StyleRole::ALL {
            let commands = self.styles.commands_for(role, &doc);
            if commands.is_empty() {
                continue;
            }
            let outcome = self.styles.batches(&commands).try_for_each(|batch| {
                self.retry
                    .run("apply styles", &self.gate, || self.service.batch_update(id, batch))
                    .map(|_| ())
            });
            match outcome {
                Ok(()) => {
                    log::debug!("Applied {} ({} commands)", role, commands.len());
                    report.applied.push((role, commands.len()));
                }
                Err(err) => {
                    log::warn!("Skipping {} styling: {}", role, err);
                    report.failed.push((role, err.to_string()));
                }
            }
        }
        report
    }
}
