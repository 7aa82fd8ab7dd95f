use std::collections::BTreeSet;
use std::time::Duration;

use regex::{Regex, RegexBuilder};

use super::{Limits, ThreatConfig};
use crate::error::ConfigError;
use crate::findings::{FindingKind, Severity};
use crate::verdict::score::ScoreWeights;

/// A compiled content rule.
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub id: String,
    pub pattern: Regex,
    pub kind: FindingKind,
    pub severity: Severity,
}

/// Compiled, immutable form of a `ThreatConfig`.
///
/// Built once and shared read-only across scans and inspectors.
/// Keyword lists are normalised to lowercase at compile time.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub dangerous_extensions: BTreeSet<String>,
    pub critical_extensions: BTreeSet<String>,
    pub suspicious_paths: Vec<Regex>,
    pub suspicious_names: Vec<String>,
    pub content_rules: Vec<ContentRule>,
    pub hex_run: Regex,
    pub hex_run_threshold: usize,
    pub suspicious_domains: Vec<String>,
    pub suspicious_tlds: BTreeSet<String>,
    pub malware_host_words: Vec<String>,
    pub phishing_keywords: Vec<String>,
    pub sensitive_permissions: BTreeSet<String>,
    pub suspicious_apis: Vec<String>,
    pub root_markers: Vec<String>,
    pub anti_debug_markers: Vec<String>,
    pub obfuscation_ratio: f64,
    pub known_bad_md5: BTreeSet<String>,
    pub known_bad_sha256: BTreeSet<String>,
    pub lookup_timeout: Duration,
    pub max_lookups_in_flight: usize,
    pub limits: Limits,
    pub weights: ScoreWeights,
}

impl RuleSet {
    pub fn compile(config: &ThreatConfig) -> Result<Self, ConfigError> {
        let suspicious_paths = config
            .paths
            .suspicious_patterns
            .iter()
            .enumerate()
            .map(|(i, p)| compile_pattern(&format!("path-{i}"), p))
            .collect::<Result<Vec<_>, _>>()?;

        let content_rules = config
            .content
            .rules
            .iter()
            .map(|r| {
                Ok(ContentRule {
                    id: r.id.clone(),
                    pattern: compile_pattern(&r.id, &r.pattern)?,
                    kind: r.kind.clone(),
                    severity: r.severity,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let hex_run = compile_pattern(
            "hex-run",
            &format!("[A-Fa-f0-9]{{{},}}", config.content.hex_run_min_len.max(1)),
        )?;

        Ok(Self {
            dangerous_extensions: lower_set(&config.extensions.dangerous, '.'),
            critical_extensions: lower_set(&config.extensions.critical, '.'),
            suspicious_paths,
            suspicious_names: lower_vec(&config.paths.suspicious_names),
            content_rules,
            hex_run,
            hex_run_threshold: config.content.hex_run_threshold,
            suspicious_domains: lower_vec(&config.endpoints.suspicious_domains),
            suspicious_tlds: lower_set(&config.endpoints.suspicious_tlds, '.'),
            malware_host_words: lower_vec(&config.endpoints.malware_host_words),
            phishing_keywords: lower_vec(&config.endpoints.phishing_keywords),
            sensitive_permissions: config
                .apk
                .sensitive_permissions
                .iter()
                .map(|p| permission_short_name(p).to_string())
                .collect(),
            suspicious_apis: config.apk.suspicious_apis.clone(),
            root_markers: config.apk.root_markers.clone(),
            anti_debug_markers: config.apk.anti_debug_markers.clone(),
            obfuscation_ratio: config.apk.obfuscation_ratio,
            known_bad_md5: lower_set(&config.reputation.known_bad_md5, ' '),
            known_bad_sha256: lower_set(&config.reputation.known_bad_sha256, ' '),
            lookup_timeout: Duration::from_millis(config.reputation.lookup_timeout_ms),
            max_lookups_in_flight: config.reputation.max_lookups_in_flight,
            limits: config.limits,
            weights: config.weights.clone(),
        })
    }

    pub fn is_dangerous_extension(&self, ext: &str) -> bool {
        self.dangerous_extensions.contains(&ext.to_ascii_lowercase())
    }

    pub fn is_critical_extension(&self, ext: &str) -> bool {
        self.critical_extensions.contains(&ext.to_ascii_lowercase())
    }

    pub fn is_sensitive_permission(&self, permission: &str) -> bool {
        self.sensitive_permissions
            .contains(permission_short_name(permission))
    }
}

impl Default for RuleSet {
    /// Built-in rules. The built-in patterns are known to compile.
    fn default() -> Self {
        match Self::compile(&ThreatConfig::default()) {
            Ok(rules) => rules,
            Err(err) => unreachable!("built-in rules failed to compile: {err}"),
        }
    }
}

/// `android.permission.CAMERA` → `CAMERA`.
pub fn permission_short_name(permission: &str) -> &str {
    permission.rsplit('.').next().unwrap_or(permission)
}

fn compile_pattern(id: &str, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            id: id.to_string(),
            source,
        })
}

fn lower_set(items: &[String], strip: char) -> BTreeSet<String> {
    items
        .iter()
        .map(|s| s.trim().trim_start_matches(strip).to_ascii_lowercase())
        .collect()
}

fn lower_vec(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.trim().to_ascii_lowercase()).collect()
}
