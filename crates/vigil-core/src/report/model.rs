use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::artifact::ArtifactKind;
use crate::verdict::RiskVerdict;

/// Top-level scan report.
///
/// Wraps the verdict with tool and artifact metadata. Deterministic for
/// identical inputs and configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub artifact: ArtifactInfo,
    pub verdict: RiskVerdict,
}

impl ScanReport {
    pub fn new(tool: ToolInfo, artifact: ArtifactInfo, verdict: RiskVerdict) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            artifact,
            verdict,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub commit: Option<String>,
}

/// Artifact metadata bound to this report. Never includes artifact bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// File name, or the URL / email address for target scans.
    pub name: Option<String>,
    pub kind: ArtifactKind,
    pub size_bytes: u64,
    pub md5: Option<String>,
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ArtifactDetails>,
}

/// Structural facts recovered for kinds that have them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactDetails {
    Pdf {
        version: Option<String>,
        page_count: usize,
        has_forms: bool,
        has_open_action: bool,
        has_javascript: bool,
    },
    Apk {
        package: Option<String>,
        components: Vec<String>,
        permission_count: usize,
        dex_files: usize,
    },
}
