use once_cell::sync::Lazy;
use regex::Regex;

use super::Inspector;
use crate::artifact::ArtifactDescriptor;
use crate::config::RuleSet;
use crate::error::InspectorError;
use crate::extract::Evidence;
use crate::extract::endpoints::{EndpointSet, host_of};
use crate::extract::target::{Target, UrlTarget};
use crate::findings::{Finding, FindingKind, Severity};

static RE_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{10,}").expect("valid digit run regex"));
static RE_LONG_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z]{25,}").expect("valid long label regex"));

/// Embedded URLs and IPs, and the URL or email target itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointInspector;

impl EndpointInspector {
    fn finding(&self, kind: FindingKind, severity: Severity, description: String) -> Finding {
        Finding::new(kind, severity, description, self.name())
    }

    fn check_extracted(&self, endpoints: &EndpointSet, rules: &RuleSet, out: &mut Vec<Finding>) {
        for url in endpoints.urls.iter().take(rules.limits.max_endpoints) {
            let Some(host) = host_of(url) else {
                continue;
            };
            if let Some(domain) = listed_domain(&host, rules) {
                out.push(self.finding(
                    FindingKind::SuspiciousUrl,
                    Severity::Medium,
                    format!("Link to suspicious host {domain}: {url}"),
                ));
            }
        }

        for ip in endpoints.ips.iter().take(rules.limits.max_endpoints) {
            out.push(self.finding(
                FindingKind::HardcodedIp,
                Severity::Low,
                format!("Hard-coded IP address {ip}"),
            ));
        }
    }

    fn check_url(&self, url: &UrlTarget, rules: &RuleSet, out: &mut Vec<Finding>) {
        if !url.is_https() {
            out.push(self.finding(
                FindingKind::InsecureTransport,
                Severity::Medium,
                format!("URL uses {} instead of HTTPS", url.scheme),
            ));
        }
        if url.is_ip {
            out.push(self.finding(
                FindingKind::SuspiciousUrl,
                Severity::Medium,
                format!("URL points at a raw IP address: {}", url.host),
            ));
        }
        if let Some(domain) = listed_domain(&url.host, rules) {
            out.push(self.finding(
                FindingKind::SuspiciousUrl,
                Severity::Medium,
                format!("URL uses a shortener or throwaway host: {domain}"),
            ));
        }

        let lower = url.raw.to_ascii_lowercase();
        let phishing: Vec<&str> = rules
            .phishing_keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .map(String::as_str)
            .collect();
        if !phishing.is_empty() {
            out.push(self.finding(
                FindingKind::PhishingPattern,
                Severity::High,
                format!("URL contains phishing keywords: {}", phishing.join(", ")),
            ));
        }
    }

    /// Checks shared by URL hosts and email domains.
    fn check_host(&self, host: &str, is_ip: bool, rules: &RuleSet, out: &mut Vec<Finding>) {
        if is_ip {
            return;
        }

        if let Some(tld) = host.rsplit('.').next()
            && rules.suspicious_tlds.contains(tld)
        {
            out.push(self.finding(
                FindingKind::SuspiciousDomain,
                Severity::Medium,
                format!("Domain uses high-abuse TLD .{tld}: {host}"),
            ));
        }

        let words: Vec<&str> = rules
            .malware_host_words
            .iter()
            .filter(|w| host.contains(w.as_str()))
            .map(String::as_str)
            .collect();
        if !words.is_empty() {
            out.push(self.finding(
                FindingKind::SuspiciousDomain,
                Severity::High,
                format!("Domain contains malware indicators ({}): {host}", words.join(", ")),
            ));
        }

        let oddities = [
            (RE_DIGIT_RUN.is_match(host), "a long run of digits"),
            (host.contains("---"), "repeated hyphens"),
            (RE_LONG_LABEL.is_match(host), "an unusually long word"),
        ];
        for (_, what) in oddities.iter().filter(|(hit, _)| *hit) {
            out.push(self.finding(
                FindingKind::SuspiciousDomain,
                Severity::Low,
                format!("Domain contains {what}: {host}"),
            ));
        }
    }
}

impl Inspector for EndpointInspector {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn inspect(
        &self,
        _artifact: &ArtifactDescriptor,
        evidence: &Evidence,
        rules: &RuleSet,
    ) -> Result<Vec<Finding>, InspectorError> {
        let mut findings = Vec::new();

        match &evidence.target {
            Some(Target::Url(url)) => {
                self.check_url(url, rules, &mut findings);
                self.check_host(&url.host, url.is_ip, rules, &mut findings);
            }
            Some(Target::Email(email)) => {
                self.check_host(&email.domain, false, rules, &mut findings);
            }
            None => {}
        }

        self.check_extracted(&evidence.endpoints, rules, &mut findings);
        Ok(findings)
    }
}

/// The configured suspicious domain that `host` equals or is a subdomain of.
fn listed_domain<'r>(host: &str, rules: &'r RuleSet) -> Option<&'r str> {
    rules
        .suspicious_domains
        .iter()
        .find(|d| host == d.as_str() || host.ends_with(&format!(".{d}")))
        .map(String::as_str)
}
