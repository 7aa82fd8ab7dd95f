use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity of a single finding.
///
/// Ordering is semantic: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Category tag of a finding.
///
/// The core set is closed; artifact-specific detections that have no
/// dedicated variant use `Other`. Serialized as a bare PascalCase string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FindingKind {
    DangerousExtension,
    PathTraversal,
    SuspiciousPath,
    SuspiciousFilename,
    HiddenFile,
    CompressionBomb,
    ExcessiveEntries,
    SuspiciousContent,
    ObfuscatedContent,
    EmbeddedScript,
    EmbeddedFile,
    SuspiciousUrl,
    SuspiciousDomain,
    HardcodedIp,
    InsecureTransport,
    PhishingPattern,
    DangerousPermission,
    ExcessivePermissions,
    SuspiciousApi,
    RootDetection,
    AntiDebugging,
    KnownMalwareHash,
    SuspiciousHashPattern,
    KnownMaliciousDomain,
    RecentDomainRegistration,
    BreachExposure,
    ReputationUnavailable,
    FileSizeAnomaly,
    MissingManifest,
    AnalysisError,
    Other(String),
}

const CORE_KINDS: &[FindingKind] = &[
    FindingKind::DangerousExtension,
    FindingKind::PathTraversal,
    FindingKind::SuspiciousPath,
    FindingKind::SuspiciousFilename,
    FindingKind::HiddenFile,
    FindingKind::CompressionBomb,
    FindingKind::ExcessiveEntries,
    FindingKind::SuspiciousContent,
    FindingKind::ObfuscatedContent,
    FindingKind::EmbeddedScript,
    FindingKind::EmbeddedFile,
    FindingKind::SuspiciousUrl,
    FindingKind::SuspiciousDomain,
    FindingKind::HardcodedIp,
    FindingKind::InsecureTransport,
    FindingKind::PhishingPattern,
    FindingKind::DangerousPermission,
    FindingKind::ExcessivePermissions,
    FindingKind::SuspiciousApi,
    FindingKind::RootDetection,
    FindingKind::AntiDebugging,
    FindingKind::KnownMalwareHash,
    FindingKind::SuspiciousHashPattern,
    FindingKind::KnownMaliciousDomain,
    FindingKind::RecentDomainRegistration,
    FindingKind::BreachExposure,
    FindingKind::ReputationUnavailable,
    FindingKind::FileSizeAnomaly,
    FindingKind::MissingManifest,
    FindingKind::AnalysisError,
];

impl FindingKind {
    pub fn as_str(&self) -> &str {
        match self {
            FindingKind::DangerousExtension => "DangerousExtension",
            FindingKind::PathTraversal => "PathTraversal",
            FindingKind::SuspiciousPath => "SuspiciousPath",
            FindingKind::SuspiciousFilename => "SuspiciousFilename",
            FindingKind::HiddenFile => "HiddenFile",
            FindingKind::CompressionBomb => "CompressionBomb",
            FindingKind::ExcessiveEntries => "ExcessiveEntries",
            FindingKind::SuspiciousContent => "SuspiciousContent",
            FindingKind::ObfuscatedContent => "ObfuscatedContent",
            FindingKind::EmbeddedScript => "EmbeddedScript",
            FindingKind::EmbeddedFile => "EmbeddedFile",
            FindingKind::SuspiciousUrl => "SuspiciousUrl",
            FindingKind::SuspiciousDomain => "SuspiciousDomain",
            FindingKind::HardcodedIp => "HardcodedIp",
            FindingKind::InsecureTransport => "InsecureTransport",
            FindingKind::PhishingPattern => "PhishingPattern",
            FindingKind::DangerousPermission => "DangerousPermission",
            FindingKind::ExcessivePermissions => "ExcessivePermissions",
            FindingKind::SuspiciousApi => "SuspiciousApi",
            FindingKind::RootDetection => "RootDetection",
            FindingKind::AntiDebugging => "AntiDebugging",
            FindingKind::KnownMalwareHash => "KnownMalwareHash",
            FindingKind::SuspiciousHashPattern => "SuspiciousHashPattern",
            FindingKind::KnownMaliciousDomain => "KnownMaliciousDomain",
            FindingKind::RecentDomainRegistration => "RecentDomainRegistration",
            FindingKind::BreachExposure => "BreachExposure",
            FindingKind::ReputationUnavailable => "ReputationUnavailable",
            FindingKind::FileSizeAnomaly => "FileSizeAnomaly",
            FindingKind::MissingManifest => "MissingManifest",
            FindingKind::AnalysisError => "AnalysisError",
            FindingKind::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindingKind {
    type Err = std::convert::Infallible;

    /// Unknown names become `Other`, so parsing never fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(CORE_KINDS
            .iter()
            .find(|k| k.as_str() == s)
            .cloned()
            .unwrap_or_else(|| FindingKind::Other(s.to_string())))
    }
}

impl Serialize for FindingKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FindingKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(kind) = raw.parse::<FindingKind>();
        Ok(kind)
    }
}

/// One detected issue.
///
/// Immutable once built: fields are private and severity cannot be
/// changed after construction. Findings are never merged or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    kind: FindingKind,
    severity: Severity,
    description: String,
    source: String,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            source: source.into(),
        }
    }

    /// A recovered, local analysis failure. Always Medium.
    pub fn analysis_error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            FindingKind::AnalysisError,
            Severity::Medium,
            message,
            source,
        )
    }

    pub fn kind(&self) -> &FindingKind {
        &self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
