use super::Inspector;
use crate::artifact::ArtifactDescriptor;
use crate::config::RuleSet;
use crate::config::rules::permission_short_name;
use crate::error::InspectorError;
use crate::extract::Evidence;
use crate::extract::hashes::FileHashes;
use crate::extract::manifest::ManifestInfo;
use crate::extract::target::Target;
use crate::findings::{Finding, FindingKind, Severity};
use crate::reputation::{BoundedReputation, ReputationQuery, ReputationReport};

const RECENT_DOMAIN_DAYS: u32 = 30;
const YOUNG_DOMAIN_DAYS: u32 = 90;

/// Known-bad lists, permission exposure and the external reputation seam.
#[derive(Debug, Clone, Default)]
pub struct ReputationInspector {
    source: Option<BoundedReputation>,
}

impl ReputationInspector {
    pub fn new(source: Option<BoundedReputation>) -> Self {
        Self { source }
    }

    fn finding(&self, kind: FindingKind, severity: Severity, description: String) -> Finding {
        Finding::new(kind, severity, description, self.name())
    }

    fn check_hashes(&self, hashes: &FileHashes, rules: &RuleSet, out: &mut Vec<Finding>) {
        if rules.known_bad_sha256.contains(&hashes.sha256)
            || rules.known_bad_md5.contains(&hashes.md5)
        {
            out.push(self.finding(
                FindingKind::KnownMalwareHash,
                Severity::Critical,
                format!("File hash is on the known-bad list (sha256 {})", hashes.sha256),
            ));
        }

        if hashes.sha256.starts_with("000000") || hashes.sha256.ends_with("ffffff") {
            out.push(self.finding(
                FindingKind::SuspiciousHashPattern,
                Severity::Medium,
                format!("Unusual SHA-256 pattern: {}", hashes.sha256),
            ));
        }
    }

    fn check_permissions(&self, manifest: &ManifestInfo, rules: &RuleSet, out: &mut Vec<Finding>) {
        let sensitive: Vec<&str> = manifest
            .permissions
            .iter()
            .filter(|p| rules.is_sensitive_permission(p))
            .map(|p| permission_short_name(p))
            .collect();

        for perm in &sensitive {
            out.push(self.finding(
                FindingKind::DangerousPermission,
                Severity::Low,
                format!("Requests sensitive permission {perm}"),
            ));
        }

        if sensitive.is_empty() {
            return;
        }
        let exposure = sensitive.len() * 10;
        let severity = if exposure > 50 {
            Severity::High
        } else if exposure > 20 {
            Severity::Medium
        } else {
            Severity::Low
        };
        out.push(self.finding(
            FindingKind::ExcessivePermissions,
            severity,
            format!("{} sensitive permissions requested", sensitive.len()),
        ));
    }

    fn lookup(
        &self,
        source: &BoundedReputation,
        query: ReputationQuery,
        out: &mut Vec<Finding>,
    ) -> Option<ReputationReport> {
        match source.lookup(&query) {
            Ok(report) => Some(report),
            Err(err) => {
                out.push(self.finding(
                    FindingKind::ReputationUnavailable,
                    Severity::Medium,
                    format!("Reputation lookup for {} failed: {err}", subject(&query)),
                ));
                None
            }
        }
    }

    fn check_external(&self, source: &BoundedReputation, evidence: &Evidence, out: &mut Vec<Finding>) {
        if let Some(hashes) = &evidence.hashes
            && let Some(report) = self.lookup(source, ReputationQuery::Hash(hashes.sha256.clone()), out)
            && report.found
        {
            out.push(self.finding(
                FindingKind::KnownMalwareHash,
                Severity::Critical,
                detail("File hash is listed by the reputation service", &report),
            ));
        }

        let Some(target) = &evidence.target else {
            return;
        };

        let domain = match target {
            Target::Url(url) if url.is_ip => None,
            _ => Some(target.host().to_string()),
        };
        if let Some(domain) = domain
            && let Some(report) = self.lookup(source, ReputationQuery::Domain(domain.clone()), out)
        {
            self.domain_outcome(&domain, &report, out);
        }

        if let Target::Email(email) = target
            && let Some(report) =
                self.lookup(source, ReputationQuery::Email(email.address.clone()), out)
            && report.found
        {
            out.push(self.finding(
                FindingKind::BreachExposure,
                Severity::High,
                detail(
                    &format!("{} appears in known data breaches", email.address),
                    &report,
                ),
            ));
        }
    }

    fn domain_outcome(&self, domain: &str, report: &ReputationReport, out: &mut Vec<Finding>) {
        if report.found {
            out.push(self.finding(
                FindingKind::KnownMaliciousDomain,
                Severity::Critical,
                detail(&format!("{domain} is listed as malicious"), report),
            ));
        }

        match report.domain_age_days {
            Some(days) if days < RECENT_DOMAIN_DAYS => out.push(self.finding(
                FindingKind::RecentDomainRegistration,
                Severity::High,
                format!("{domain} was registered {days} days ago"),
            )),
            Some(days) if days < YOUNG_DOMAIN_DAYS => out.push(self.finding(
                FindingKind::RecentDomainRegistration,
                Severity::Medium,
                format!("{domain} was registered {days} days ago"),
            )),
            _ => {}
        }
    }
}

impl Inspector for ReputationInspector {
    fn name(&self) -> &'static str {
        "reputation"
    }

    fn blocking(&self) -> bool {
        self.source.is_some()
    }

    fn inspect(
        &self,
        _artifact: &ArtifactDescriptor,
        evidence: &Evidence,
        rules: &RuleSet,
    ) -> Result<Vec<Finding>, InspectorError> {
        let mut findings = Vec::new();

        if let Some(hashes) = &evidence.hashes {
            self.check_hashes(hashes, rules, &mut findings);
        }
        if let Some(manifest) = &evidence.manifest {
            self.check_permissions(manifest, rules, &mut findings);
        }
        if let Some(source) = &self.source {
            self.check_external(source, evidence, &mut findings);
        }

        Ok(findings)
    }
}

fn subject(query: &ReputationQuery) -> &str {
    match query {
        ReputationQuery::Hash(h) | ReputationQuery::Domain(h) | ReputationQuery::Email(h) => h,
    }
}

fn detail(base: &str, report: &ReputationReport) -> String {
    match &report.detail {
        Some(d) => format!("{base} ({d})"),
        None => base.to_string(),
    }
}
