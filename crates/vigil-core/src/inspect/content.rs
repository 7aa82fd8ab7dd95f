use super::Inspector;
use crate::artifact::ArtifactDescriptor;
use crate::config::RuleSet;
use crate::error::InspectorError;
use crate::extract::Evidence;
use crate::extract::apk_code::ApkCodeInfo;
use crate::extract::text::TextUnit;
use crate::findings::{Finding, FindingKind, Severity};

/// Pattern rules over readable text, plus DEX code markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentInspector;

impl ContentInspector {
    fn check_unit(&self, unit: &TextUnit, rules: &RuleSet, out: &mut Vec<Finding>) {
        // One finding per rule per unit, however many times it matches.
        for rule in &rules.content_rules {
            if let Some(m) = rule.pattern.find(&unit.text) {
                out.push(Finding::new(
                    rule.kind.clone(),
                    rule.severity,
                    format!(
                        "Pattern '{}' matched in {}: {}",
                        rule.id,
                        unit.origin,
                        excerpt(m.as_str())
                    ),
                    self.name(),
                ));
            }
        }

        let hex_runs = rules.hex_run.find_iter(&unit.text).count();
        if hex_runs > rules.hex_run_threshold {
            out.push(Finding::new(
                FindingKind::ObfuscatedContent,
                Severity::Medium,
                format!("{hex_runs} long hexadecimal runs in {}", unit.origin),
                self.name(),
            ));
        }
    }

    fn check_code(&self, code: &ApkCodeInfo, out: &mut Vec<Finding>) {
        for api in &code.suspicious_apis {
            out.push(Finding::new(
                FindingKind::SuspiciousApi,
                Severity::Medium,
                format!("Code references {api}"),
                self.name(),
            ));
        }
        if !code.root_markers.is_empty() {
            out.push(Finding::new(
                FindingKind::RootDetection,
                Severity::Low,
                format!("Root detection markers: {}", code.root_markers.join(", ")),
                self.name(),
            ));
        }
        if !code.anti_debug_markers.is_empty() {
            out.push(Finding::new(
                FindingKind::AntiDebugging,
                Severity::Medium,
                format!(
                    "Anti-debugging markers: {}",
                    code.anti_debug_markers.join(", ")
                ),
                self.name(),
            ));
        }
        if code.obfuscated {
            out.push(Finding::new(
                FindingKind::ObfuscatedContent,
                Severity::Medium,
                format!(
                    "DEX code looks obfuscated ({:.0}% control bytes)",
                    code.control_ratio * 100.0
                ),
                self.name(),
            ));
        }
    }
}

impl Inspector for ContentInspector {
    fn name(&self) -> &'static str {
        "content"
    }

    fn inspect(
        &self,
        _artifact: &ArtifactDescriptor,
        evidence: &Evidence,
        rules: &RuleSet,
    ) -> Result<Vec<Finding>, InspectorError> {
        let mut findings = Vec::new();

        for unit in &evidence.text {
            self.check_unit(unit, rules, &mut findings);
        }
        if let Some(code) = &evidence.apk_code {
            self.check_code(code, &mut findings);
        }

        Ok(findings)
    }
}

fn excerpt(matched: &str) -> String {
    const MAX: usize = 40;
    match matched.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &matched[..cut]),
        None => matched.to_string(),
    }
}
