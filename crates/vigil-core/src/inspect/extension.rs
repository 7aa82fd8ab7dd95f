use super::Inspector;
use crate::artifact::ArtifactDescriptor;
use crate::config::RuleSet;
use crate::error::InspectorError;
use crate::extract::Evidence;
use crate::extract::archive::extension_of;
use crate::findings::{Finding, FindingKind, Severity};

/// Flags executable payload types by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionInspector;

impl ExtensionInspector {
    fn check(&self, name: &str, context: &str, rules: &RuleSet) -> Option<Finding> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let ext = extension_of(base)?;
        if !rules.is_dangerous_extension(&ext) {
            return None;
        }
        let severity = if rules.is_critical_extension(&ext) {
            Severity::Critical
        } else {
            Severity::High
        };
        Some(Finding::new(
            FindingKind::DangerousExtension,
            severity,
            format!("Dangerous file type .{ext} {context}: {name}"),
            self.name(),
        ))
    }
}

impl Inspector for ExtensionInspector {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn inspect(
        &self,
        artifact: &ArtifactDescriptor,
        evidence: &Evidence,
        rules: &RuleSet,
    ) -> Result<Vec<Finding>, InspectorError> {
        let mut findings = Vec::new();

        if let Some(name) = artifact.filename() {
            findings.extend(self.check(name, "submitted", rules));
        }

        if let Some(listing) = &evidence.archive {
            findings.extend(
                listing
                    .files()
                    .filter_map(|e| self.check(&e.name, "in archive", rules)),
            );
        }

        if let Some(pdf) = &evidence.pdf {
            // Embedded payloads are capped at High.
            findings.extend(
                pdf.embedded_names
                    .iter()
                    .filter_map(|n| self.check(n, "embedded in document", rules))
                    .map(|f| {
                        Finding::new(
                            f.kind().clone(),
                            Severity::High,
                            f.description(),
                            f.source(),
                        )
                    }),
            );
        }

        Ok(findings)
    }
}
