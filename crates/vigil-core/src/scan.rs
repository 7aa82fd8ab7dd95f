//! Scan coordinator.
//!
//! Pipeline per scan:
//!
//!   received → kind detected → evidence extracted → inspectors run
//!            → aggregated → returned
//!
//! Cancellation is checked between stages. Inspector failures and panics
//! are contained and reported as findings; only the conditions in
//! `ScanFailed` end a scan without a verdict.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use crate::artifact::{ArtifactDescriptor, ArtifactKind, ScanInput};
use crate::config::RuleSet;
use crate::error::{EvidenceError, InspectorError, ScanFailed};
use crate::extract::{self, Evidence};
use crate::findings::Finding;
use crate::inspect::{Inspector, InspectorSet};
use crate::report::model::{ArtifactDetails, ArtifactInfo, ScanReport, ToolInfo};
use crate::reputation::{BoundedReputation, ReputationSource};
use crate::verdict::{RiskVerdict, aggregate};

/// Cooperative cancellation flag shared with a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ScanFailed> {
        if self.is_cancelled() {
            Err(ScanFailed::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs scans against a fixed rule set and inspector composition.
///
/// Holds no per-scan state; one scanner may serve concurrent scans.
#[derive(Debug, Clone)]
pub struct Scanner {
    rules: Arc<RuleSet>,
    inspectors: InspectorSet,
}

impl Scanner {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            inspectors: InspectorSet::standard(None),
        }
    }

    /// Enable external lookups, bounded by the configured timeout and
    /// in-flight limit.
    pub fn with_reputation(mut self, source: Arc<dyn ReputationSource>) -> Self {
        let bounded = BoundedReputation::new(source, self.rules.lookup_timeout)
            .with_max_in_flight(self.rules.max_lookups_in_flight);
        self.inspectors = InspectorSet::standard(Some(bounded));
        self
    }

    pub fn with_inspectors(mut self, inspectors: InspectorSet) -> Self {
        self.inspectors = inspectors;
        self
    }

    pub fn scan(&self, input: ScanInput, hint: Option<&str>) -> Result<RiskVerdict, ScanFailed> {
        self.scan_with_cancel(input, hint, &CancelToken::new())
    }

    pub fn scan_with_cancel(
        &self,
        input: ScanInput,
        hint: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<RiskVerdict, ScanFailed> {
        self.run(input, hint, cancel).map(|(_, verdict)| verdict)
    }

    /// Scan and wrap the verdict with tool and artifact metadata.
    pub fn scan_report(
        &self,
        input: ScanInput,
        hint: Option<&str>,
        tool: ToolInfo,
    ) -> Result<ScanReport, ScanFailed> {
        let (artifact, verdict) = self.run(input, hint, &CancelToken::new())?;
        Ok(ScanReport::new(tool, artifact, verdict))
    }

    fn run(
        &self,
        input: ScanInput,
        hint: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<(ArtifactInfo, RiskVerdict), ScanFailed> {
        let span = info_span!("scan", kind = tracing::field::Empty);
        let _guard = span.enter();

        cancel.check()?;
        let kind = input.detect_kind(hint);
        span.record("kind", kind.as_str());

        let artifact = ArtifactDescriptor::new(input, kind);
        info!(size_bytes = artifact.len(), "artifact received");

        if kind.requires_header() && artifact.is_empty() {
            return Err(ScanFailed::EmptyArtifact { kind });
        }

        cancel.check()?;
        let evidence = extract::gather(&artifact, &self.rules).map_err(|e| {
            warn!(error = %e, "evidence extraction failed");
            scan_failed(kind, e)
        })?;
        for (extractor, err) in &evidence.errors {
            debug!(extractor, error = %err, "extractor degraded");
        }

        cancel.check()?;
        let mut findings = evidence.error_findings();
        findings.extend(self.run_inspectors(&artifact, &evidence));

        cancel.check()?;
        let verdict = aggregate(findings, &self.rules.weights);
        info!(
            level = %verdict.risk_level(),
            score = verdict.risk_score(),
            findings = verdict.findings().len(),
            "scan complete"
        );

        Ok((artifact_info(&artifact, &evidence), verdict))
    }

    /// Run the kind's inspectors in parallel. Output keeps inspector order.
    ///
    /// Blocking inspectors run on a scoped thread of their own so that
    /// waiting on a lookup never occupies a rayon worker.
    fn run_inspectors(&self, artifact: &ArtifactDescriptor, evidence: &Evidence) -> Vec<Finding> {
        let (blocking, compute): (Vec<_>, Vec<_>) = self
            .inspectors
            .for_kind(artifact.kind())
            .iter()
            .enumerate()
            .partition(|(_, inspector)| inspector.blocking());

        let run = |&(index, inspector): &(usize, &Arc<dyn Inspector>)| {
            (index, self.run_one(inspector.as_ref(), artifact, evidence))
        };

        let mut results: Vec<(usize, Vec<Finding>)> = thread::scope(|scope| {
            let io = (!blocking.is_empty())
                .then(|| scope.spawn(|| blocking.iter().map(run).collect::<Vec<_>>()));
            let mut done: Vec<_> = compute.par_iter().map(run).collect();
            if let Some(handle) = io {
                // run_one contains panics, so the thread always returns.
                done.extend(handle.join().unwrap_or_default());
            }
            done
        });

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().flat_map(|(_, findings)| findings).collect()
    }

    fn run_one(
        &self,
        inspector: &dyn Inspector,
        artifact: &ArtifactDescriptor,
        evidence: &Evidence,
    ) -> Vec<Finding> {
        let name = inspector.name();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            inspector.inspect(artifact, evidence, &self.rules)
        }))
        .unwrap_or_else(|payload| Err(InspectorError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(findings) => {
                debug!(inspector = name, findings = findings.len(), "inspector finished");
                findings
            }
            Err(err) => {
                warn!(inspector = name, error = %err, "inspector failed");
                vec![Finding::analysis_error(name, err.to_string())]
            }
        }
    }
}

fn scan_failed(kind: ArtifactKind, err: EvidenceError) -> ScanFailed {
    match err {
        EvidenceError::InvalidUrl { .. } | EvidenceError::InvalidEmail(_) => {
            ScanFailed::InvalidTarget(err.to_string())
        }
        EvidenceError::InvalidArchive(reason) => ScanFailed::InvalidFormat { kind, reason },
        other => ScanFailed::InvalidFormat {
            kind,
            reason: other.to_string(),
        },
    }
}

fn artifact_info(artifact: &ArtifactDescriptor, evidence: &Evidence) -> ArtifactInfo {
    let name = artifact
        .filename()
        .or_else(|| artifact.target())
        .map(str::to_string);

    ArtifactInfo {
        name,
        kind: artifact.kind(),
        size_bytes: artifact.len(),
        md5: evidence.hashes.as_ref().map(|h| h.md5.clone()),
        sha256: evidence.hashes.as_ref().map(|h| h.sha256.clone()),
        details: artifact_details(artifact.kind(), evidence),
    }
}

fn artifact_details(kind: ArtifactKind, evidence: &Evidence) -> Option<ArtifactDetails> {
    match kind {
        ArtifactKind::Pdf => evidence.pdf.as_ref().map(|pdf| ArtifactDetails::Pdf {
            version: pdf.version.clone(),
            page_count: pdf.page_count,
            has_forms: pdf.acroform,
            has_open_action: pdf.open_action,
            has_javascript: pdf.has_script(),
        }),
        ArtifactKind::Apk => {
            let manifest = evidence.manifest.as_ref();
            Some(ArtifactDetails::Apk {
                package: manifest.and_then(|m| m.package.clone()),
                components: manifest.map(|m| m.components.clone()).unwrap_or_default(),
                permission_count: manifest.map_or(0, |m| m.permissions.len()),
                dex_files: evidence.apk_code.as_ref().map_or(0, |c| c.dex_files),
            })
        }
        _ => None,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{FindingKind, Severity};
    use crate::verdict::RiskLevel;

    struct Exploding;

    impl Inspector for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn inspect(
            &self,
            _: &ArtifactDescriptor,
            _: &Evidence,
            _: &RuleSet,
        ) -> Result<Vec<Finding>, InspectorError> {
            panic!("kaboom");
        }
    }

    struct Failing;

    impl Inspector for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn inspect(
            &self,
            _: &ArtifactDescriptor,
            _: &Evidence,
            _: &RuleSet,
        ) -> Result<Vec<Finding>, InspectorError> {
            Err(InspectorError::MissingEvidence("archive"))
        }
    }

    struct Fixed(Severity);

    impl Inspector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn inspect(
            &self,
            _: &ArtifactDescriptor,
            _: &Evidence,
            _: &RuleSet,
        ) -> Result<Vec<Finding>, InspectorError> {
            Ok(vec![Finding::new(
                FindingKind::SuspiciousContent,
                self.0,
                "fixed",
                self.name(),
            )])
        }
    }

    /// Reports whether it ran on a rayon worker.
    struct Waiting;

    impl Inspector for Waiting {
        fn name(&self) -> &'static str {
            "waiting"
        }

        fn blocking(&self) -> bool {
            true
        }

        fn inspect(
            &self,
            _: &ArtifactDescriptor,
            _: &Evidence,
            _: &RuleSet,
        ) -> Result<Vec<Finding>, InspectorError> {
            Ok(vec![Finding::new(
                FindingKind::SuspiciousContent,
                Severity::Low,
                format!("on pool: {}", rayon::current_thread_index().is_some()),
                self.name(),
            )])
        }
    }

    fn scanner_with(inspectors: Vec<Arc<dyn Inspector>>) -> Scanner {
        Scanner::new(Arc::new(RuleSet::default()))
            .with_inspectors(InspectorSet::new().with(ArtifactKind::Generic, inspectors))
    }

    fn text_input() -> ScanInput {
        ScanInput::file(b"hello world".to_vec(), Some("notes.txt"))
    }

    #[test]
    fn panicking_inspector_does_not_abort_siblings() {
        let scanner = scanner_with(vec![
            Arc::new(Exploding),
            Arc::new(Fixed(Severity::Low)),
        ]);

        let verdict = scanner.scan(text_input(), None).unwrap();
        let findings = verdict.findings();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].kind(), &FindingKind::AnalysisError);
        assert_eq!(findings[0].severity(), Severity::Medium);
        assert_eq!(findings[0].source(), "exploding");
        assert!(findings[0].description().contains("kaboom"));
        assert_eq!(findings[1].source(), "fixed");
        assert_eq!(verdict.risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn inspector_error_becomes_analysis_error() {
        let scanner = scanner_with(vec![Arc::new(Failing)]);
        let verdict = scanner.scan(text_input(), None).unwrap();

        assert_eq!(verdict.findings().len(), 1);
        assert_eq!(verdict.findings()[0].source(), "failing");
        assert!(verdict.findings()[0].description().contains("archive"));
    }

    #[test]
    fn findings_keep_inspector_order() {
        let scanner = scanner_with(vec![
            Arc::new(Fixed(Severity::High)),
            Arc::new(Failing),
            Arc::new(Fixed(Severity::Low)),
        ]);

        let verdict = scanner.scan(text_input(), None).unwrap();
        let sources: Vec<&str> = verdict.findings().iter().map(|f| f.source()).collect();

        assert_eq!(sources, vec!["fixed", "failing", "fixed"]);
    }

    #[test]
    fn blocking_inspectors_run_off_the_pool_in_order() {
        let scanner = scanner_with(vec![
            Arc::new(Fixed(Severity::High)),
            Arc::new(Waiting),
            Arc::new(Exploding),
            Arc::new(Fixed(Severity::Low)),
        ]);

        let verdict = scanner.scan(text_input(), None).unwrap();
        let sources: Vec<&str> = verdict.findings().iter().map(|f| f.source()).collect();

        assert_eq!(sources, vec!["fixed", "waiting", "exploding", "fixed"]);
        assert_eq!(verdict.findings()[1].description(), "on pool: false");
    }

    #[test]
    fn cancelled_scan_fails() {
        let scanner = Scanner::new(Arc::new(RuleSet::default()));
        let cancel = CancelToken::new();
        cancel.cancel();

        assert_eq!(
            scanner.scan_with_cancel(text_input(), None, &cancel),
            Err(ScanFailed::Cancelled)
        );
    }

    #[test]
    fn empty_container_fails_but_empty_generic_does_not() {
        let scanner = Scanner::new(Arc::new(RuleSet::default()));

        assert_eq!(
            scanner.scan(ScanInput::file(Vec::new(), None), Some("pdf")),
            Err(ScanFailed::EmptyArtifact {
                kind: ArtifactKind::Pdf
            })
        );

        let verdict = scanner.scan(ScanInput::file(Vec::new(), None), None).unwrap();
        assert_eq!(verdict.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn invalid_targets_fail() {
        let scanner = Scanner::new(Arc::new(RuleSet::default()));

        assert!(matches!(
            scanner.scan(ScanInput::Url("not a url".into()), None),
            Err(ScanFailed::InvalidTarget(_))
        ));
        assert!(matches!(
            scanner.scan(ScanInput::Email("nobody".into()), None),
            Err(ScanFailed::InvalidTarget(_))
        ));
    }

    #[test]
    fn panic_payloads_are_described() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
