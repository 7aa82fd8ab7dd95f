use std::fmt;

use serde::{Deserialize, Serialize};

use crate::findings::Finding;

/// Overall risk level of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// CI-compatible process exit code.
    ///
    /// - Low      → 0
    /// - Medium   → 1
    /// - High     → 2
    /// - Critical → 3
    pub const fn exit_code(self) -> i32 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// The aggregated result of one scan.
///
/// Built only by `verdict::aggregate`; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskVerdict {
    risk_score: u8,
    risk_level: RiskLevel,
    findings: Vec<Finding>,
    recommendations: Vec<String>,
}

impl RiskVerdict {
    pub(crate) fn new(
        risk_score: u8,
        risk_level: RiskLevel,
        findings: Vec<Finding>,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            risk_score,
            risk_level,
            findings,
            recommendations,
        }
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn exit_code(&self) -> i32 {
        self.risk_level.exit_code()
    }
}
