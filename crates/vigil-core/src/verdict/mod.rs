//! Risk aggregation: a deterministic reducer from findings to a verdict.

pub mod classify;
pub mod model;
pub mod recommend;
pub mod score;

pub use classify::{SeverityTally, classify};
pub use model::{RiskLevel, RiskVerdict};
pub use score::ScoreWeights;

use crate::findings::Finding;

/// Reduce findings to a verdict.
///
/// Cannot fail. Level, score and recommendations are independent of the
/// order of `findings`; the verdict keeps the findings in the order given.
pub fn aggregate(findings: Vec<Finding>, weights: &ScoreWeights) -> RiskVerdict {
    let level = classify(SeverityTally::of(&findings));
    let score = weights.score(&findings);
    let recommendations = recommend::recommend(&findings, level);

    RiskVerdict::new(score, level, findings, recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{FindingKind, Severity};

    fn f(kind: FindingKind, sev: Severity) -> Finding {
        Finding::new(kind, sev, "d", "test")
    }

    #[test]
    fn empty_findings_are_low_and_zero() {
        let v = aggregate(vec![], &ScoreWeights::default());
        assert_eq!(v.risk_level(), RiskLevel::Low);
        assert_eq!(v.risk_score(), 0);
        assert_eq!(v.recommendations(), [recommend::SAFE.to_string()]);
    }

    #[test]
    fn verdict_is_independent_of_order_except_findings() {
        let a = vec![
            f(FindingKind::DangerousExtension, Severity::Critical),
            f(FindingKind::HiddenFile, Severity::Low),
            f(FindingKind::SuspiciousUrl, Severity::Medium),
        ];
        let mut b = a.clone();
        b.reverse();

        let va = aggregate(a, &ScoreWeights::default());
        let vb = aggregate(b, &ScoreWeights::default());

        assert_eq!(va.risk_level(), vb.risk_level());
        assert_eq!(va.risk_score(), vb.risk_score());
        assert_eq!(va.recommendations(), vb.recommendations());
        assert_eq!(va.risk_score(), 40 + 5 + 20);
    }

    #[test]
    fn score_and_level_are_independent_axes() {
        // Twenty Low findings max out the score but not the level.
        let findings = vec![f(FindingKind::SuspiciousFilename, Severity::Low); 20];
        let v = aggregate(findings, &ScoreWeights::default());
        assert_eq!(v.risk_score(), 100);
        assert_eq!(v.risk_level(), RiskLevel::Low);
    }
}
