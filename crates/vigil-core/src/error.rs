//! Error taxonomy for the triage pipeline.
//!
//! Errors are layered so that a local failure never escapes its layer:
//!
//! - `EvidenceError`  → one extractor; evidence is treated as absent
//! - `InspectorError` → one inspector; converted to a Medium finding
//! - `ScanFailed`     → the coordinator only; the artifact could not be scanned
//!
//! `ConfigError` and `LookupError` cover rule compilation and the external
//! reputation seam.

use thiserror::Error;

use crate::artifact::ArtifactKind;
use crate::findings::{Finding, FindingKind, Severity};

/// Failure of a single evidence extractor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("not a readable ZIP archive: {0}")]
    InvalidArchive(String),

    #[error("archive member '{name}' could not be read: {reason}")]
    UnreadableMember { name: String, reason: String },

    #[error("AndroidManifest.xml not found")]
    MissingManifest,

    #[error("malformed AndroidManifest.xml: {0}")]
    MalformedManifest(String),

    #[error("missing %PDF header")]
    NotPdf,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
}

impl EvidenceError {
    /// Whether the absence of this evidence is itself worth reporting.
    pub fn is_material(&self) -> bool {
        matches!(
            self,
            EvidenceError::UnreadableMember { .. }
                | EvidenceError::MissingManifest
                | EvidenceError::MalformedManifest(_)
        )
    }

    /// Surface a material extraction failure as a Medium finding.
    pub fn to_finding(&self, source: &str) -> Finding {
        match self {
            EvidenceError::MissingManifest => Finding::new(
                FindingKind::MissingManifest,
                Severity::Medium,
                "APK does not contain AndroidManifest.xml",
                source,
            ),
            other => Finding::analysis_error(source, other.to_string()),
        }
    }
}

/// Failure local to one inspector.
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("required evidence '{0}' is unavailable")]
    MissingEvidence(&'static str),

    #[error("inspector panicked: {0}")]
    Panicked(String),
}

/// Terminal scan failure, distinct from a clean verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanFailed {
    #[error("{kind} artifact is empty")]
    EmptyArtifact { kind: ArtifactKind },

    #[error("artifact is not a valid {kind}: {reason}")]
    InvalidFormat { kind: ArtifactKind, reason: String },

    #[error("invalid scan target: {0}")]
    InvalidTarget(String),

    #[error("scan cancelled")]
    Cancelled,
}

/// Rule compilation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern for rule '{id}': {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure of an outward reputation lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("reputation service unavailable: {0}")]
    Unavailable(String),
}
