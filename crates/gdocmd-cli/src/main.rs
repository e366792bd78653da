//! gdocmd: CLI tool to export Google Docs to Markdown and publish Markdown to Google Docs

mod auth;
mod config;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{CONFIG_FILE_NAME, Config};
use gdocmd_core::{
    BackoffGate, ExportOptions, Exporter, PandocConverter, PublishOptions, Publisher, SplitMode,
    WriteStatus,
};
use gdocmd_folder::{FolderExportOptions, export_folder, list_folder};
use gdocs_client::{DocumentId, FolderId, GoogleClient};

#[derive(Parser, Debug)]
#[command(name = "gdocmd")]
#[command(about = "Export Google Docs to Markdown and publish Markdown to Google Docs")]
#[command(version)]
#[command(after_help = "Examples:
  gdocmd publish notes.md                         # Create or update the linked document
  gdocmd publish notes.md --new -f <folder-url>   # Always create a new document in a folder
  gdocmd export <doc-url> -o notes.md             # Export one document
  gdocmd export <doc-url> --split tabs            # One file per tab
  gdocmd export-folder <folder-url> -o docs/ -j4  # Export a whole folder with 4 jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to _gdocmd.toml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a Markdown file to Google Docs
    Publish {
        /// Markdown file to publish
        input: PathBuf,

        /// Document title (defaults to the file stem)
        #[arg(short, long)]
        title: Option<String>,

        /// Drive folder ID or URL for a newly created document
        #[arg(short, long)]
        folder: Option<String>,

        /// Word template for the converter
        #[arg(long)]
        reference_doc: Option<PathBuf>,

        /// Keep the intermediate .docx next to the input
        #[arg(long)]
        keep_docx: bool,

        /// Create a new document even if the file is linked to one
        #[arg(long = "new")]
        force_new: bool,

        /// Do not record the document ID in the input file
        #[arg(long)]
        no_save_id: bool,
    },

    /// Export a Google Doc to Markdown
    Export {
        /// Document ID or URL
        document: String,

        /// Output file (or directory for --split tabs)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,

        /// Split into one file per section or per tab
        #[arg(long, value_enum)]
        split: Option<SplitArg>,

        /// Deepest heading level that starts a new section
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        split_level: u8,

        /// Only export this tab (ID or title)
        #[arg(long)]
        tab: Option<String>,
    },

    /// Export every Google Doc in a Drive folder to Markdown
    ExportFolder {
        /// Folder ID or URL
        folder: String,

        /// Output directory
        #[arg(short, long, required_unless_present = "list_only")]
        output: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,

        /// Only list the documents in the folder
        #[arg(long)]
        list_only: bool,

        /// Number of parallel jobs (defaults to number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Create a _gdocmd.toml configuration file in the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SplitArg {
    /// Split at headings (see --split-level)
    Sections,
    /// One file per document tab
    Tabs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Schema => {
            println!("{}", Config::json_schema_string()?);
            Ok(())
        }
        Command::Init { force } => init_config(force),
        command => {
            let config = load_config(cli.config.as_deref())?;
            run(command, &config)
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path);
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    match Config::load_from_dir(&cwd)? {
        Some(config) => {
            log::debug!("Loaded {}", cwd.join(CONFIG_FILE_NAME).display());
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn init_config(force: bool) -> Result<()> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let content = Config::sample().to_toml_with_schema()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write: {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

fn connect(config: &Config) -> Result<GoogleClient> {
    let token = auth::access_token(config.auth.token_file.as_deref())?;
    GoogleClient::new(token).context("Failed to create Google API client")
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Publish {
            input,
            title,
            folder,
            reference_doc,
            keep_docx,
            force_new,
            no_save_id,
        } => {
            if !input.is_file() {
                bail!("Input file does not exist: {}", input.display());
            }
            let folder = match folder.or_else(|| config.publish.folder.clone()) {
                Some(f) => Some(
                    FolderId::parse(&f).with_context(|| format!("Invalid folder: {}", f))?,
                ),
                None => None,
            };
            let title = match title {
                Some(t) => t,
                None => input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .with_context(|| format!("Cannot derive a title from {}", input.display()))?,
            };
            let options = PublishOptions {
                title,
                folder,
                reference_doc: reference_doc.or_else(|| config.publish.reference_doc.clone()),
                force_new,
                keep_artifact: keep_docx,
                no_save_id,
            };
            publish(&input, &options, config)
        }
        Command::Export {
            document,
            output,
            force,
            split,
            split_level,
            tab,
        } => {
            let id = DocumentId::parse(&document)
                .with_context(|| format!("Invalid document: {}", document))?;
            let options = ExportOptions {
                output,
                split: split.map(|s| match s {
                    SplitArg::Sections => SplitMode::Heading(split_level),
                    SplitArg::Tabs => SplitMode::Tabs,
                }),
                tab,
                force,
                writer: config.export.writer_options()?,
            };
            export(&id, &options, config)
        }
        Command::ExportFolder {
            folder,
            output,
            force,
            list_only,
            jobs,
        } => {
            let folder_id =
                FolderId::parse(&folder).with_context(|| format!("Invalid folder: {}", folder))?;
            export_drive_folder(&folder_id, output, force, list_only, jobs, config)
        }
        Command::Init { .. } | Command::Schema => Ok(()),
    }
}

fn publish(input: &Path, options: &PublishOptions, config: &Config) -> Result<()> {
    let client = connect(config)?;
    let converter = match &config.publish.pandoc {
        Some(program) => PandocConverter::new(program),
        None => PandocConverter::default(),
    };
    let publisher = Publisher::new(&client, &converter)
        .with_retry(config.retry.policy())
        .with_styles(config.style.rules());

    let outcome = publisher
        .publish_file(input, options)
        .with_context(|| format!("Failed to publish: {}", input.display()))?;

    if outcome.created {
        log::info!("Created document \"{}\"", options.title);
    } else {
        log::info!(
            "Updated document \"{}\" ({} attempt(s))",
            options.title,
            outcome.upload_attempts
        );
    }
    for (role, reason) in &outcome.style_report.failed {
        log::warn!("Style rule {} was not applied: {}", role, reason);
    }

    println!("Document ID: {}", outcome.document_id);
    println!("URL: {}", outcome.url);
    Ok(())
}

fn export(id: &DocumentId, options: &ExportOptions, config: &Config) -> Result<()> {
    let client = connect(config)?;
    let gate = BackoffGate::new();
    let exporter = Exporter::new(&client, &gate).with_retry(config.retry.policy());

    let files = exporter
        .export(id, options)
        .with_context(|| format!("Failed to export document {}", id))?;

    for file in &files {
        match file.status {
            WriteStatus::Written => println!("{}", file.path.display()),
            WriteStatus::Skipped => log::info!("Kept existing {}", file.path.display()),
        }
    }
    Ok(())
}

fn export_drive_folder(
    folder: &FolderId,
    output: Option<PathBuf>,
    force: bool,
    list_only: bool,
    jobs: Option<usize>,
    config: &Config,
) -> Result<()> {
    let client = connect(config)?;
    let retry = config.retry.policy();
    let gate = Arc::new(BackoffGate::new());

    let entries = list_folder(&client, folder, &retry, &gate)
        .with_context(|| format!("Failed to list folder {}", folder))?;

    if list_only {
        for entry in &entries {
            println!("{}\t{}", entry.id, entry.name);
        }
        return Ok(());
    }

    let Some(output_dir) = output else {
        bail!("--output is required unless --list-only is given");
    };
    if entries.is_empty() {
        log::warn!("No documents found in folder {}", folder);
        return Ok(());
    }

    let options = FolderExportOptions {
        output_dir,
        force,
        parallel_jobs: jobs.or(config.export.jobs),
        writer: config.export.writer_options()?,
        retry,
        gate,
    };
    let result = export_folder(&client, &entries, &options)
        .with_context(|| format!("Failed to export folder {}", folder))?;

    for (_, path) in &result.exported {
        println!("{}", path.display());
    }
    for (entry, reason) in &result.failed {
        log::error!("Failed to export \"{}\" ({}): {}", entry.name, entry.id, reason);
    }
    log::info!("{}", result.summary());

    if result.has_failures() {
        bail!("{} document(s) failed to export", result.failed.len());
    }
    Ok(())
}
