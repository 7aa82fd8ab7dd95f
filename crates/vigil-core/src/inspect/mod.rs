//! Inspectors: one detection axis each, all behind the same contract.
//!
//! Responsibilities:
//! - Turn evidence into findings for a single axis
//! - Skip checks whose evidence is absent
//!
//! Non-responsibilities:
//! - Reading artifact bytes directly (extractors)
//! - Scoring or ranking findings (verdict)
//! - Recovering from their own failures (the coordinator converts
//!   errors and panics into `AnalysisError` findings)

pub mod content;
pub mod endpoint;
pub mod extension;
pub mod reputation;
pub mod structural;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::config::RuleSet;
use crate::error::InspectorError;
use crate::extract::Evidence;
use crate::findings::Finding;
use crate::reputation::BoundedReputation;

pub use content::ContentInspector;
pub use endpoint::EndpointInspector;
pub use extension::ExtensionInspector;
pub use reputation::ReputationInspector;
pub use structural::StructuralInspector;

/// A single detection axis.
///
/// Implementations hold no mutable state and must not read the clock, so
/// the same artifact, evidence and rules always yield the same findings.
pub trait Inspector: Send + Sync {
    /// Stable name, used as the `source` of emitted findings.
    fn name(&self) -> &'static str;

    /// Whether `inspect` may wait on external I/O. Blocking inspectors run
    /// on a dedicated thread, outside the shared compute pool.
    fn blocking(&self) -> bool {
        false
    }

    fn inspect(
        &self,
        artifact: &ArtifactDescriptor,
        evidence: &Evidence,
        rules: &RuleSet,
    ) -> Result<Vec<Finding>, InspectorError>;
}

/// Which inspectors run for which artifact kind.
#[derive(Clone, Default)]
pub struct InspectorSet {
    by_kind: BTreeMap<ArtifactKind, Vec<Arc<dyn Inspector>>>,
}

impl InspectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default composition.
    ///
    /// Files with a known container format get every axis; unknown files
    /// only content and endpoint; URL and email targets only endpoint and
    /// reputation.
    pub fn standard(reputation: Option<BoundedReputation>) -> Self {
        let extension: Arc<dyn Inspector> = Arc::new(ExtensionInspector);
        let structural: Arc<dyn Inspector> = Arc::new(StructuralInspector);
        let content: Arc<dyn Inspector> = Arc::new(ContentInspector);
        let reputation: Arc<dyn Inspector> = Arc::new(ReputationInspector::new(reputation));
        let endpoint: Arc<dyn Inspector> = Arc::new(EndpointInspector);

        let full = vec![
            Arc::clone(&extension),
            Arc::clone(&structural),
            Arc::clone(&content),
            Arc::clone(&reputation),
            Arc::clone(&endpoint),
        ];

        Self::new()
            .with(ArtifactKind::Archive, full.clone())
            .with(ArtifactKind::Apk, full.clone())
            .with(ArtifactKind::Pdf, full)
            .with(
                ArtifactKind::Generic,
                vec![Arc::clone(&content), Arc::clone(&endpoint)],
            )
            .with(
                ArtifactKind::Url,
                vec![Arc::clone(&endpoint), Arc::clone(&reputation)],
            )
            .with(ArtifactKind::Email, vec![endpoint, reputation])
    }

    /// Replace the inspectors for one kind.
    pub fn with(mut self, kind: ArtifactKind, inspectors: Vec<Arc<dyn Inspector>>) -> Self {
        self.by_kind.insert(kind, inspectors);
        self
    }

    pub fn for_kind(&self, kind: ArtifactKind) -> &[Arc<dyn Inspector>] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

impl std::fmt::Debug for InspectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (kind, inspectors) in &self.by_kind {
            let names: Vec<&str> = inspectors.iter().map(|i| i.name()).collect();
            map.entry(kind, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &InspectorSet, kind: ArtifactKind) -> Vec<&'static str> {
        set.for_kind(kind).iter().map(|i| i.name()).collect()
    }

    #[test]
    fn standard_composition() {
        let set = InspectorSet::standard(None);
        let full = vec!["extension", "structural", "content", "reputation", "endpoint"];

        assert_eq!(names(&set, ArtifactKind::Archive), full);
        assert_eq!(names(&set, ArtifactKind::Apk), full);
        assert_eq!(names(&set, ArtifactKind::Pdf), full);
        assert_eq!(names(&set, ArtifactKind::Generic), vec!["content", "endpoint"]);
        assert_eq!(names(&set, ArtifactKind::Url), vec!["endpoint", "reputation"]);
        assert_eq!(names(&set, ArtifactKind::Email), vec!["endpoint", "reputation"]);
    }

    #[test]
    fn unconfigured_kind_runs_nothing() {
        assert!(InspectorSet::new().for_kind(ArtifactKind::Pdf).is_empty());
    }
}
