//! External Markdown to `.docx` converter

use crate::error::ConversionError;
use crate::marker;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Pandoc input format: pipe tables and fenced code, no heading anchors
pub const PANDOC_FROM: &str = "markdown+pipe_tables+backtick_code_blocks-auto_identifiers";

/// Produces an upload artifact from Markdown text
pub trait Converter: Send + Sync {
    /// Convert `markdown` into an artifact written at `out`
    fn markdown_to_artifact(
        &self,
        markdown: &str,
        out: &Path,
        reference_doc: Option<&Path>,
    ) -> Result<(), ConversionError>;
}

/// Runs `pandoc` (or a compatible program)
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for converting `input` into `out`
    pub fn args(&self, input: &Path, out: &Path, reference_doc: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            input.display().to_string(),
            "-o".to_string(),
            out.display().to_string(),
            "--from".to_string(),
            PANDOC_FROM.to_string(),
            "--wrap".to_string(),
            "none".to_string(),
        ];
        if let Some(reference) = reference_doc {
            args.push("--reference-doc".to_string());
            args.push(reference.display().to_string());
        }
        args
    }
}

impl Converter for PandocConverter {
    fn markdown_to_artifact(
        &self,
        markdown: &str,
        out: &Path,
        reference_doc: Option<&Path>,
    ) -> Result<(), ConversionError> {
        let input = out.with_extension("md");
        std::fs::write(&input, prepare_markdown(markdown))?;

        let reference_doc = reference_doc.filter(|p| {
            let exists = p.exists();
            if !exists {
                log::warn!("Reference document {} not found; ignoring", p.display());
            }
            exists
        });

        let args = self.args(&input, out, reference_doc);
        log::debug!("Running {} {}", self.program.display(), args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| ConversionError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConversionError::Failed {
                status: output.status.to_string(),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Markdown as handed to the converter: marker removed, lists separated
pub fn prepare_markdown(markdown: &str) -> String {
    preprocess_lists(&marker::strip(markdown))
}

/// Insert a blank line before a list item that directly follows a
/// non-blank, non-list line.
///
/// Without it pandoc folds the item into the preceding paragraph.
pub fn preprocess_lists(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut prev: Option<&str> = None;
    for line in markdown.split_inclusive('\n') {
        if is_list_line(line)
            && let Some(p) = prev
            && !p.trim().is_empty()
            && !is_list_line(p)
        {
            out.push('\n');
        }
        out.push_str(line);
        prev = Some(line);
    }
    out
}

/// `- `, `* `, `+ ` or `1. ` at column zero
fn is_list_line(line: &str) -> bool {
    if let Some(rest) = line.strip_prefix(['-', '*', '+']) {
        return rest.starts_with(char::is_whitespace);
    }
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    digits > 0
        && line[digits..]
            .strip_prefix('.')
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}
