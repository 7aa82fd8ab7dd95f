use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use vigil_core::artifact::read::read_artifact;
use vigil_core::logging::{LogFormat, init_tracing};
use vigil_core::report::{model::ToolInfo, render};
use vigil_core::{RuleSet, ScanInput, Scanner, ThreatConfig};

mod args;

/// Exit code when the artifact could not be scanned at all.
const SCAN_FAILED_EXIT: i32 = 4;

fn main() -> Result<()> {
    let args = args::Args::parse();

    let log_format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(log_format, "warn");

    let config = match &args.config {
        Some(path) => ThreatConfig::load(path)?,
        None => ThreatConfig::default(),
    };
    let rules = RuleSet::compile(&config)?;
    let scanner = Scanner::new(Arc::new(rules));

    let input = match (&args.path, &args.url, &args.email) {
        (Some(path), _, _) => read_artifact(path)?,
        (_, Some(url), _) => ScanInput::Url(url.clone()),
        (_, _, Some(email)) => ScanInput::Email(email.clone()),
        (None, None, None) => anyhow::bail!("no scan target given"),
    };

    let tool = ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: args.commit.clone(),
    };

    let (output, code) = match scanner.scan_report(input, args.kind.as_deref(), tool) {
        Ok(report) => {
            let output = match args.format {
                args::OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                args::OutputFormat::Text => render::render_text(&report),
            };
            (output, report.exit_code())
        }
        Err(failed) => {
            tracing::error!(error = %failed, "scan failed");
            let output = match args.format {
                args::OutputFormat::Json => {
                    serde_json::to_string_pretty(&serde_json::json!({ "error": failed.to_string() }))?
                }
                args::OutputFormat::Text => format!("scan failed: {failed}\n"),
            };
            (output, SCAN_FAILED_EXIT)
        }
    };

    match args.out {
        Some(path) => std::fs::write(path, &output)?,
        None => print!("{output}"),
    }

    std::process::exit(code);
}
