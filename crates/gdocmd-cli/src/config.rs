//! Configuration file support for gdocmd CLI
//!
//! Loads settings from `_gdocmd.toml` configuration file.

use anyhow::{Context, Result, bail};
use gdocmd_blocks::{UnderlineStyle, WriterOptions};
use gdocmd_core::{RetryPolicy, StyleRules};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_gdocmd.toml";

/// Schema URL for the configuration file
pub const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/gdocmd/gdocmd/main/crates/gdocmd-cli/schema/gdocmd.schema.json";

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Credential configuration
    #[serde(skip_serializing_if = "AuthConfig::is_empty")]
    pub auth: AuthConfig,
    /// Markdown to Google Docs publishing
    #[serde(skip_serializing_if = "PublishConfig::is_empty")]
    pub publish: PublishConfig,
    /// Google Docs to Markdown export
    #[serde(skip_serializing_if = "ExportConfig::is_empty")]
    pub export: ExportConfig,
    /// House style applied after publishing
    #[serde(skip_serializing_if = "StyleConfig::is_empty")]
    pub style: StyleConfig,
    /// Retry behavior for rate limits and transient failures
    #[serde(skip_serializing_if = "RetryConfig::is_empty")]
    pub retry: RetryConfig,
}

/// Credential configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth token JSON file (default: $GOOGLE_DRIVE_TOKEN_FILE or ~/.google-drive-upload-token.json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl AuthConfig {
    fn is_empty(&self) -> bool {
        self.token_file.is_none()
    }
}

/// Publishing configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct PublishConfig {
    /// Drive folder ID or URL for newly created documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Word template passed to pandoc as --reference-doc
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_doc: Option<PathBuf>,
    /// Converter program (default: "pandoc")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pandoc: Option<PathBuf>,
}

impl PublishConfig {
    fn is_empty(&self) -> bool {
        self.folder.is_none() && self.reference_doc.is_none() && self.pandoc.is_none()
    }
}

/// Export configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct ExportConfig {
    /// Spaces of indentation per list level (default: 2)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_width: Option<usize>,
    /// Underline rendering: "html" (<u>text</u>) or "emphasis" (***text***) (default: "html")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    /// Parallel jobs for folder export (default: number of CPUs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl ExportConfig {
    fn is_empty(&self) -> bool {
        self.indent_width.is_none() && self.underline.is_none() && self.jobs.is_none()
    }

    /// Writer options with defaults filled in
    pub fn writer_options(&self) -> Result<WriterOptions> {
        let defaults = WriterOptions::default();
        let underline = match self.underline.as_deref() {
            None => defaults.underline,
            Some(s) if s.eq_ignore_ascii_case("html") => UnderlineStyle::Html,
            Some(s) if s.eq_ignore_ascii_case("emphasis") => UnderlineStyle::Emphasis,
            Some(other) => bail!(
                "Invalid export.underline '{}': expected \"html\" or \"emphasis\"",
                other
            ),
        };
        Ok(WriterOptions {
            indent_width: self.indent_width.unwrap_or(defaults.indent_width),
            underline,
        })
    }
}

/// Style rule configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct StyleConfig {
    /// Font family for headings (default: "Proxima Nova")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_font: Option<String>,
    /// Font weight for headings (default: 700)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_weight: Option<u32>,
    /// Space below each paragraph in points (default: 6)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_space_below_pt: Option<f64>,
    /// Table border width in points (default: 0.5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width_pt: Option<f64>,
    /// Table border color as #rrggbb (default: "#b7b7b7")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    /// Table header row background as #rrggbb (default: "#f3f3f3")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_background: Option<String>,
    /// Bold table header text (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_bold: Option<bool>,
    /// Table cell font size in points (default: 11)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_font_size_pt: Option<f64>,
    /// Maximum commands per batch update request (default: 30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl StyleConfig {
    fn is_empty(&self) -> bool {
        self.heading_font.is_none()
            && self.heading_weight.is_none()
            && self.paragraph_space_below_pt.is_none()
            && self.border_width_pt.is_none()
            && self.border_color.is_none()
            && self.header_background.is_none()
            && self.header_bold.is_none()
            && self.table_font_size_pt.is_none()
            && self.batch_size.is_none()
    }

    /// Style rules with defaults filled in
    pub fn rules(&self) -> StyleRules {
        let d = StyleRules::default();
        StyleRules {
            heading_font: self.heading_font.clone().unwrap_or(d.heading_font),
            heading_weight: self.heading_weight.unwrap_or(d.heading_weight),
            paragraph_space_below_pt: self
                .paragraph_space_below_pt
                .unwrap_or(d.paragraph_space_below_pt),
            border_width_pt: self.border_width_pt.unwrap_or(d.border_width_pt),
            border_color: self.border_color.clone().unwrap_or(d.border_color),
            header_background: self.header_background.clone().unwrap_or(d.header_background),
            header_bold: self.header_bold.unwrap_or(d.header_bold),
            table_font_size_pt: self.table_font_size_pt.unwrap_or(d.table_font_size_pt),
            batch_size: self.batch_size.unwrap_or(d.batch_size),
        }
    }
}

/// Retry configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per remote call, including the first (default: 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Delay after the first failure in milliseconds, doubled each retry (default: 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    /// Upper bound for a single delay in milliseconds (default: 64000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

impl RetryConfig {
    fn is_empty(&self) -> bool {
        self.max_attempts.is_none() && self.base_delay_ms.is_none() && self.max_delay_ms.is_none()
    }

    /// Retry policy with defaults filled in
    pub fn policy(&self) -> RetryPolicy {
        let d = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(d.max_attempts),
            base_delay: self
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(d.base_delay),
            max_delay: self
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(d.max_delay),
        }
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from a directory (looks for `_gdocmd.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate JSON schema for the configuration
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Generate JSON schema as a string
    pub fn json_schema_string() -> Result<String> {
        let schema = Self::json_schema();
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON schema")
    }

    /// Serialize configuration to TOML string with schema directive
    pub fn to_toml_with_schema(&self) -> Result<String> {
        let toml_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        Ok(format!("#:schema {}\n\n{}", SCHEMA_URL, toml_content))
    }

    /// Create a sample configuration with common defaults for init command
    pub fn sample() -> Self {
        let style = StyleRules::default();
        Config {
            auth: AuthConfig { token_file: None },
            publish: PublishConfig {
                folder: None,
                reference_doc: None,
                pandoc: Some(PathBuf::from("pandoc")),
            },
            export: ExportConfig {
                indent_width: Some(2),
                underline: Some("html".to_string()),
                jobs: None,
            },
            style: StyleConfig {
                heading_font: Some(style.heading_font),
                heading_weight: Some(style.heading_weight),
                paragraph_space_below_pt: Some(style.paragraph_space_below_pt),
                border_width_pt: Some(style.border_width_pt),
                border_color: Some(style.border_color),
                header_background: Some(style.header_background),
                header_bold: Some(style.header_bold),
                table_font_size_pt: Some(style.table_font_size_pt),
                batch_size: Some(style.batch_size),
            },
            retry: RetryConfig {
                max_attempts: Some(5),
                base_delay_ms: Some(1000),
                max_delay_ms: Some(64000),
            },
        }
    }
}
