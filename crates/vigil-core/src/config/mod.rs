//! Threat configuration.
//!
//! Every list and threshold the inspectors consult lives here. A
//! `ThreatConfig` is plain data (loadable from JSON, every field optional);
//! `RuleSet` is its compiled, immutable form shared by all scans.

pub mod rules;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::findings::{FindingKind, Severity};
use crate::verdict::score::ScoreWeights;

pub use rules::{ContentRule, RuleSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    pub extensions: ExtensionPolicy,
    pub paths: PathPolicy,
    pub content: ContentPolicy,
    pub endpoints: EndpointPolicy,
    pub apk: ApkPolicy,
    pub reputation: ReputationPolicy,
    pub limits: Limits,
    pub weights: ScoreWeights,
}

impl ThreatConfig {
    /// Load a configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

/// Extensions treated as executable payloads (lowercase, no dot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionPolicy {
    pub dangerous: Vec<String>,
    /// Subset of `dangerous` reported as Critical.
    pub critical: Vec<String>,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            dangerous: strings(&[
                "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "app", "deb",
                "pkg", "dmg", "msi", "run", "rpm",
            ]),
            critical: strings(&["exe", "bat", "cmd", "scr"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathPolicy {
    /// Regexes matched against full entry paths.
    pub suspicious_patterns: Vec<String>,
    /// Case-insensitive substrings matched against entry paths.
    pub suspicious_names: Vec<String>,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self {
            suspicious_patterns: strings(&[r"[A-Za-z]:[\\/]", "/etc/", "/bin/", "/usr/"]),
            suspicious_names: strings(&[
                "autorun.inf",
                "desktop.ini",
                "thumbs.db",
                "virus",
                "trojan",
                "malware",
                "backdoor",
                "keylogger",
                "rootkit",
                "exploit",
            ]),
        }
    }
}

/// One configured content rule. Patterns are compiled case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRuleConfig {
    pub id: String,
    pub pattern: String,
    pub kind: FindingKind,
    pub severity: Severity,
}

impl ContentRuleConfig {
    pub fn new(id: &str, pattern: &str, kind: FindingKind, severity: Severity) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            kind,
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPolicy {
    pub rules: Vec<ContentRuleConfig>,
    /// Minimum length of a hex run counted as encoded data.
    pub hex_run_min_len: usize,
    /// Hex runs above this count yield `ObfuscatedContent`.
    pub hex_run_threshold: usize,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        let keyword = |id: &str, pattern: &str| {
            ContentRuleConfig::new(id, pattern, FindingKind::SuspiciousContent, Severity::Medium)
        };
        let script = |id: &str, pattern: &str| {
            ContentRuleConfig::new(id, pattern, FindingKind::EmbeddedScript, Severity::High)
        };

        Self {
            rules: vec![
                keyword("eval", r"eval\s*\("),
                keyword("exec", r"exec\s*\("),
                keyword("system", r"system\s*\("),
                keyword("shell-exec", r"shell_exec"),
                keyword("base64-decode", r"base64_decode"),
                keyword("cmd-exe", r"cmd\.exe"),
                keyword("powershell", r"powershell"),
                keyword("wget", r"wget"),
                keyword("curl", r"curl"),
                keyword("backdoor", r"backdoor"),
                keyword("trojan", r"trojan"),
                keyword("keylogger", r"keylogger"),
                keyword("unescape", r"unescape"),
                keyword("from-char-code", r"fromCharCode"),
                keyword("activex", r"ActiveXObject"),
                keyword("wscript-shell", r"WScript\.Shell"),
                keyword("shellcode", r"shellcode"),
                keyword("document-write", r"document\.write"),
                keyword("script-tag", r"<script"),
                script("pdf-js", r"/JS\s*[\(<]"),
                script("pdf-javascript", r"/JavaScript\b"),
                script("app-alert", r"app\.alert"),
                script("this-print", r"this\.print"),
                script("util-printf", r"util\.printf"),
            ],
            hex_run_min_len: 20,
            hex_run_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPolicy {
    /// Shorteners and throwaway hosts, matched as host suffixes.
    pub suspicious_domains: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub malware_host_words: Vec<String>,
    pub phishing_keywords: Vec<String>,
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self {
            suspicious_domains: strings(&[
                "bit.ly",
                "tinyurl.com",
                "t.co",
                "goo.gl",
                "tempfile.org",
                "filehosting.org",
                "pastebin.com",
                "discord.gg",
                "t.me",
            ]),
            suspicious_tlds: strings(&["tk", "ml", "ga", "cf"]),
            malware_host_words: strings(&[
                "malware",
                "phishing",
                "scam",
                "fake",
                "suspicious",
                "trojan",
                "virus",
                "spam",
                "fraud",
                "hack",
            ]),
            phishing_keywords: strings(&[
                "secure-login",
                "verify-account",
                "suspended-account",
                "paypal-security",
                "amazon-verify",
                "microsoft-login",
                "bank-update",
                "credit-card",
                "social-security",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApkPolicy {
    /// Permission short names (without the `android.permission.` prefix).
    pub sensitive_permissions: Vec<String>,
    pub suspicious_apis: Vec<String>,
    pub root_markers: Vec<String>,
    pub anti_debug_markers: Vec<String>,
    /// Control-byte ratio of DEX code above which it is considered obfuscated.
    pub obfuscation_ratio: f64,
}

impl Default for ApkPolicy {
    fn default() -> Self {
        Self {
            sensitive_permissions: strings(&[
                "CAMERA",
                "RECORD_AUDIO",
                "ACCESS_FINE_LOCATION",
                "ACCESS_COARSE_LOCATION",
                "READ_CONTACTS",
                "WRITE_CONTACTS",
                "READ_SMS",
                "SEND_SMS",
                "CALL_PHONE",
                "READ_PHONE_STATE",
                "WRITE_EXTERNAL_STORAGE",
                "READ_EXTERNAL_STORAGE",
                "SYSTEM_ALERT_WINDOW",
                "WRITE_SETTINGS",
                "INSTALL_PACKAGES",
            ]),
            suspicious_apis: strings(&[
                "Runtime.exec",
                "ProcessBuilder",
                "System.loadLibrary",
                "DexClassLoader",
                "PathClassLoader",
                "URLClassLoader",
            ]),
            root_markers: strings(&[
                "/system/xbin/su",
                "/system/bin/su",
                "superuser",
                "busybox",
                "Superuser.apk",
            ]),
            anti_debug_markers: strings(&["android_server_gdbserver", "TracerPid", "ptrace"]),
            obfuscation_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationPolicy {
    pub known_bad_md5: Vec<String>,
    pub known_bad_sha256: Vec<String>,
    pub lookup_timeout_ms: u64,
    /// Lookups allowed to run at once, timed-out ones included.
    pub max_lookups_in_flight: usize,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            known_bad_md5: Vec::new(),
            known_bad_sha256: Vec::new(),
            lookup_timeout_ms: 3000,
            max_lookups_in_flight: 16,
        }
    }
}

/// Resource bounds and structural thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest archive member read as a text unit.
    pub max_member_bytes: u64,
    /// Largest prefix of a document read as text.
    pub max_text_bytes: u64,
    /// Extracted URLs checked per artifact.
    pub max_endpoints: usize,
    pub bomb_high_ratio: u64,
    pub bomb_critical_ratio: u64,
    pub max_entries: usize,
    pub tiny_file_bytes: u64,
    pub huge_file_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_member_bytes: 100 * 1024,
            max_text_bytes: 10 * 1024 * 1024,
            max_endpoints: 10,
            bomb_high_ratio: 100,
            bomb_critical_ratio: 1000,
            max_entries: 10_000,
            tiny_file_bytes: 10,
            huge_file_bytes: 100 * 1024 * 1024,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
