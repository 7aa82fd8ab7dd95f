use super::model::RiskLevel;
use crate::findings::{Finding, FindingKind};

pub const SAFE: &str = "No threats detected; the artifact appears safe";

pub const BASELINE: [&str; 2] = [
    "Scan with updated security tools before opening",
    "Open only in an isolated environment",
];

pub const ESCALATION: &str = "Treat this artifact as highly dangerous";

/// Kind-specific advice, emitted in this order, each entry at most once.
const ADVICE: &[(&[FindingKind], &[&str])] = &[
    (
        &[FindingKind::DangerousExtension],
        &["Do not run executable files from this artifact"],
    ),
    (
        &[FindingKind::PathTraversal, FindingKind::SuspiciousPath],
        &["Extract only with a tool that blocks path traversal"],
    ),
    (
        &[FindingKind::CompressionBomb, FindingKind::ExcessiveEntries],
        &["Do not extract this archive"],
    ),
    (
        &[FindingKind::EmbeddedScript],
        &["Disable JavaScript in the document reader"],
    ),
    (
        &[FindingKind::EmbeddedFile],
        &["Do not extract embedded files"],
    ),
    (
        &[
            FindingKind::SuspiciousUrl,
            FindingKind::SuspiciousDomain,
            FindingKind::KnownMaliciousDomain,
            FindingKind::RecentDomainRegistration,
            FindingKind::PhishingPattern,
            FindingKind::HardcodedIp,
            FindingKind::InsecureTransport,
        ],
        &["Do not click embedded links"],
    ),
    (
        &[
            FindingKind::DangerousPermission,
            FindingKind::ExcessivePermissions,
        ],
        &["Review requested permissions before installing"],
    ),
    (
        &[
            FindingKind::SuspiciousApi,
            FindingKind::RootDetection,
            FindingKind::AntiDebugging,
        ],
        &["Install apps only from trusted stores"],
    ),
    (
        &[FindingKind::KnownMalwareHash],
        &["Quarantine this artifact and report it"],
    ),
    (
        &[FindingKind::BreachExposure],
        &[
            "Change passwords for affected accounts",
            "Enable two-factor authentication",
        ],
    ),
    (
        &[FindingKind::ReputationUnavailable],
        &["Re-run the scan when reputation services are reachable"],
    ),
    (
        &[FindingKind::AnalysisError, FindingKind::MissingManifest],
        &["Review manually; parts of the artifact could not be analysed"],
    ),
    (
        &[
            FindingKind::SuspiciousContent,
            FindingKind::ObfuscatedContent,
        ],
        &["Review file contents before use"],
    ),
];

/// Build the recommendation list for a verdict.
///
/// Depends only on which kinds are present and on the level, so it is
/// independent of finding order.
pub fn recommend(findings: &[Finding], level: RiskLevel) -> Vec<String> {
    if findings.is_empty() {
        return vec![SAFE.to_string()];
    }

    let mut out: Vec<String> = BASELINE.iter().map(|s| s.to_string()).collect();

    for (kinds, advice) in ADVICE {
        if findings.iter().any(|f| kinds.contains(f.kind())) {
            out.extend(advice.iter().map(|s| s.to_string()));
        }
    }

    if level.is_elevated() {
        out.push(ESCALATION.to_string());
    }
    out
}
