use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::findings::{Finding, FindingKind};

/// Per-kind contribution of a finding to the numeric risk score.
///
/// Keys are finding kind names (`Other` kinds use their own name). Kinds
/// without an entry contribute `default_weight`. Negative weights are
/// allowed; the final score is clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub default_weight: i32,
    pub per_kind: BTreeMap<String, i32>,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        let per_kind = [
            (FindingKind::DangerousExtension, 40),
            (FindingKind::DangerousPermission, 10),
            (FindingKind::ExcessivePermissions, 0),
            (FindingKind::FileSizeAnomaly, 10),
            (FindingKind::HiddenFile, 5),
            (FindingKind::ReputationUnavailable, 5),
        ]
        .into_iter()
        .map(|(kind, weight)| (kind.as_str().to_string(), weight))
        .collect();

        Self {
            default_weight: 20,
            per_kind,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, kind: &FindingKind) -> i32 {
        self.per_kind
            .get(kind.as_str())
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Sum of weights, clamped to `[0, 100]`.
    pub fn score(&self, findings: &[Finding]) -> u8 {
        let total: i64 = findings
            .iter()
            .map(|f| i64::from(self.weight(f.kind())))
            .sum();
        total.clamp(0, 100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Severity;

    fn finding(kind: FindingKind) -> Finding {
        Finding::new(kind, Severity::Medium, "x", "test")
    }

    #[test]
    fn unlisted_kinds_use_default_weight() {
        let w = ScoreWeights::default();
        assert_eq!(w.weight(&FindingKind::SuspiciousContent), 20);
        assert_eq!(w.weight(&FindingKind::Other("LaunchAction".into())), 20);
        assert_eq!(w.weight(&FindingKind::DangerousExtension), 40);
    }

    #[test]
    fn score_is_clamped_high() {
        let findings: Vec<Finding> = (0..10)
            .map(|_| finding(FindingKind::DangerousExtension))
            .collect();
        assert_eq!(ScoreWeights::default().score(&findings), 100);
    }

    #[test]
    fn negative_weights_clamp_at_zero() {
        let mut w = ScoreWeights::default();
        w.per_kind.insert("HiddenFile".into(), -50);

        let findings = vec![finding(FindingKind::HiddenFile), finding(FindingKind::SuspiciousUrl)];
        assert_eq!(w.score(&findings), 0);
    }

    #[test]
    fn deserializes_partial_overrides() {
        let w: ScoreWeights = serde_json::from_str(r#"{"default_weight": 7}"#).unwrap();
        assert_eq!(w.default_weight, 7);
        assert_eq!(w.per_kind, ScoreWeights::default().per_kind);
    }
}
