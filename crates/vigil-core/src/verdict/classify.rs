//! Risk level classification.
//!
//! Responsibilities:
//! - Tally finding severities
//! - Map the tally to a single `RiskLevel` through a fixed decision table
//!
//! Non-responsibilities:
//! - Producing findings (inspectors)
//! - Numeric scoring (`verdict::score`)
//!
//! The table is evaluated top to bottom; the first matching row wins:
//!
//!   critical > 0 → Critical
//!   high     > 2 → Critical
//!   high     > 0 → High
//!   medium   > 3 → High
//!   medium   > 0 → Medium
//!   otherwise    → Low
//!
//! The level depends only on the counts, never on finding order.

use super::model::RiskLevel;
use crate::findings::{Finding, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityTally {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl SeverityTally {
    pub fn of(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut t, f| {
            match f.severity() {
                Severity::Low => t.low += 1,
                Severity::Medium => t.medium += 1,
                Severity::High => t.high += 1,
                Severity::Critical => t.critical += 1,
            }
            t
        })
    }
}

pub fn classify(tally: SeverityTally) -> RiskLevel {
    if tally.critical > 0 || tally.high > 2 {
        RiskLevel::Critical
    } else if tally.high > 0 || tally.medium > 3 {
        RiskLevel::High
    } else if tally.medium > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
