use crate::TOOL_NAME;
use crate::report::model::{ArtifactDetails, ScanReport};

pub fn render_text(report: &ScanReport) -> String {
    let verdict = &report.verdict;
    let artifact = &report.artifact;

    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    out.push_str(&format!(
        "Artifact: {} ({}, {} bytes)\n",
        artifact.name.as_deref().unwrap_or("-"),
        artifact.kind,
        artifact.size_bytes
    ));
    if let Some(sha256) = &artifact.sha256 {
        out.push_str(&format!("SHA-256: {sha256}\n"));
    }
    match &artifact.details {
        Some(ArtifactDetails::Pdf {
            version,
            page_count,
            has_forms,
            has_open_action,
            has_javascript,
        }) => {
            out.push_str(&format!(
                "PDF: version {}, {} page(s), forms: {}, open action: {}, JavaScript: {}\n",
                version.as_deref().unwrap_or("unknown"),
                page_count,
                yes_no(*has_forms),
                yes_no(*has_open_action),
                yes_no(*has_javascript)
            ));
        }
        Some(ArtifactDetails::Apk {
            package,
            components,
            permission_count,
            dex_files,
        }) => {
            out.push_str(&format!(
                "Package: {} ({} permission(s), {} DEX file(s))\n",
                package.as_deref().unwrap_or("unknown"),
                permission_count,
                dex_files
            ));
            if !components.is_empty() {
                out.push_str(&format!("Components: {}\n", components.join(", ")));
            }
        }
        None => {}
    }
    out.push_str(&format!(
        "Risk: {} (score {}/100)\n",
        verdict.risk_level(),
        verdict.risk_score()
    ));
    out.push_str("Findings:\n");
    if verdict.findings().is_empty() {
        out.push_str("  (none)\n");
    }
    for f in verdict.findings() {
        out.push_str(&format!(
            "  - [{}] {} ({}): {}\n",
            f.severity(),
            f.kind(),
            f.source(),
            f.description()
        ));
    }
    out.push_str("Recommendations:\n");
    for r in verdict.recommendations() {
        out.push_str(&format!("  * {r}\n"));
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
