//! DEX byte-pattern matcher.
//!
//! No bytecode is decoded. Markers are searched as raw byte substrings of
//! each `classes*.dex` member.

use super::text::control_ratio;
use crate::config::RuleSet;
use crate::util::deterministic::sort_unique;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApkCodeInfo {
    pub dex_files: usize,
    pub suspicious_apis: Vec<String>,
    pub root_markers: Vec<String>,
    pub anti_debug_markers: Vec<String>,
    /// Highest control-byte ratio seen across DEX files.
    pub control_ratio: f64,
    pub obfuscated: bool,
}

pub fn is_dex_member(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.to_ascii_lowercase().ends_with(".dex")
}

/// Scan DEX member contents for the configured code markers.
pub fn scan_dex<'a>(dex: impl IntoIterator<Item = &'a [u8]>, rules: &RuleSet) -> ApkCodeInfo {
    let mut info = ApkCodeInfo::default();

    for bytes in dex {
        info.dex_files += 1;
        info.suspicious_apis
            .extend(present(bytes, &rules.suspicious_apis));
        info.root_markers.extend(present(bytes, &rules.root_markers));
        info.anti_debug_markers
            .extend(present(bytes, &rules.anti_debug_markers));

        let ratio = control_ratio(bytes);
        if ratio > info.control_ratio {
            info.control_ratio = ratio;
        }
    }

    sort_unique(&mut info.suspicious_apis);
    sort_unique(&mut info.root_markers);
    sort_unique(&mut info.anti_debug_markers);
    info.obfuscated = info.control_ratio > rules.obfuscation_ratio;
    info
}

fn present(haystack: &[u8], markers: &[String]) -> Vec<String> {
    markers
        .iter()
        .filter(|m| !m.is_empty() && contains(haystack, m.as_bytes()))
        .cloned()
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
