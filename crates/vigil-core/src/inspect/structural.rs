use super::Inspector;
use crate::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::config::RuleSet;
use crate::error::InspectorError;
use crate::extract::Evidence;
use crate::extract::archive::{ArchiveEntry, ArchiveListing};
use crate::extract::pdf::PdfMarkers;
use crate::findings::{Finding, FindingKind, Severity};

/// Container layout checks: paths, names, sizes and ratios.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralInspector;

impl StructuralInspector {
    fn finding(&self, kind: FindingKind, severity: Severity, description: String) -> Finding {
        Finding::new(kind, severity, description, self.name())
    }

    fn check_entry(&self, entry: &ArchiveEntry, rules: &RuleSet, out: &mut Vec<Finding>) {
        let name = entry.name.as_str();

        if is_traversal(name) {
            out.push(self.finding(
                FindingKind::PathTraversal,
                Severity::Critical,
                format!("Path traversal in archive entry: {name}"),
            ));
        }

        if rules.suspicious_paths.iter().any(|re| re.is_match(name)) {
            out.push(self.finding(
                FindingKind::SuspiciousPath,
                Severity::Medium,
                format!("Archive entry targets a system path: {name}"),
            ));
        }

        let lower = name.to_ascii_lowercase();
        if let Some(word) = rules.suspicious_names.iter().find(|w| lower.contains(w.as_str())) {
            out.push(self.finding(
                FindingKind::SuspiciousFilename,
                Severity::Medium,
                format!("Suspicious file name '{word}': {name}"),
            ));
        }

        let base = entry.basename();
        if base.starts_with('.') && base != "." && base != ".." {
            out.push(self.finding(
                FindingKind::HiddenFile,
                Severity::Low,
                format!("Hidden file in archive: {name}"),
            ));
        }
    }

    fn check_listing(&self, listing: &ArchiveListing, rules: &RuleSet, out: &mut Vec<Finding>) {
        for entry in &listing.entries {
            self.check_entry(entry, rules, out);
        }

        let limits = &rules.limits;
        if let Some(ratio) = listing.compression_ratio() {
            let severity = if ratio > limits.bomb_critical_ratio as f64 {
                Some(Severity::Critical)
            } else if ratio > limits.bomb_high_ratio as f64 {
                Some(Severity::High)
            } else {
                None
            };
            if let Some(severity) = severity {
                out.push(self.finding(
                    FindingKind::CompressionBomb,
                    severity,
                    format!(
                        "Compression ratio {ratio:.0}:1 ({} bytes expand to {})",
                        listing.archive_len,
                        listing.total_uncompressed()
                    ),
                ));
            }
        }

        if listing.entries.len() > limits.max_entries {
            out.push(self.finding(
                FindingKind::ExcessiveEntries,
                Severity::High,
                format!("Archive holds {} entries", listing.entries.len()),
            ));
        }
    }

    fn check_pdf(&self, pdf: &PdfMarkers, out: &mut Vec<Finding>) {
        if pdf.has_embedded_content() {
            out.push(self.finding(
                FindingKind::EmbeddedFile,
                Severity::Medium,
                format!(
                    "Document contains embedded files ({} embedded, {} attachments)",
                    pdf.embedded_files, pdf.file_attachments
                ),
            ));
        }
        if pdf.launch {
            out.push(self.finding(
                FindingKind::Other("LaunchAction".into()),
                Severity::High,
                "Document declares a /Launch action".into(),
            ));
        }
    }

    fn check_size(&self, size: u64, rules: &RuleSet, out: &mut Vec<Finding>) {
        let limits = &rules.limits;
        let anomaly = if size == 0 {
            Some((Severity::Low, "File is empty".to_string()))
        } else if size < limits.tiny_file_bytes {
            Some((Severity::Medium, format!("File is unusually small ({size} bytes)")))
        } else if size > limits.huge_file_bytes {
            Some((Severity::Low, format!("File is unusually large ({size} bytes)")))
        } else {
            None
        };

        if let Some((severity, description)) = anomaly {
            out.push(self.finding(FindingKind::FileSizeAnomaly, severity, description));
        }
    }
}

impl Inspector for StructuralInspector {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn inspect(
        &self,
        artifact: &ArtifactDescriptor,
        evidence: &Evidence,
        rules: &RuleSet,
    ) -> Result<Vec<Finding>, InspectorError> {
        let mut findings = Vec::new();

        if let Some(listing) = &evidence.archive {
            self.check_listing(listing, rules, &mut findings);
        }
        if let Some(pdf) = &evidence.pdf {
            self.check_pdf(pdf, &mut findings);
        }
        if matches!(
            artifact.kind(),
            ArtifactKind::Archive | ArtifactKind::Apk | ArtifactKind::Pdf
        ) {
            self.check_size(artifact.len(), rules, &mut findings);
        }

        Ok(findings)
    }
}

/// A `..` path component, or a path rooted at `/` or `\`.
pub fn is_traversal(name: &str) -> bool {
    name.starts_with(['/', '\\']) || name.split(['/', '\\']).any(|part| part == "..")
}
