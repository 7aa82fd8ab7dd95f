use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "vigil",
    version,
    about = "Security triage for archives, APKs, PDFs, URLs and email addresses"
)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["path", "url", "email"])
))]
pub struct Args {
    /// Path to the file to scan
    pub path: Option<PathBuf>,

    /// Scan a URL instead of a file
    #[arg(long)]
    pub url: Option<String>,

    /// Scan an email address instead of a file
    #[arg(long)]
    pub email: Option<String>,

    /// Declared artifact kind (zip, apk, pdf, file or a MIME type)
    #[arg(long)]
    pub kind: Option<String>,

    /// Threat configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Emit logs to stderr as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Optional git commit hash for tool metadata
    #[arg(long)]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
