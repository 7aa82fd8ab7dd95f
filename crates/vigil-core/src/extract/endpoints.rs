//! URL and IPv4 extraction from text units.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::TextUnit;
use crate::util::deterministic::dedup_preserving_order;

static RE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhttps?://[^\s<>"{}|\\^`\[\]()']+"#).expect("valid URL regex")
});

// Candidates only; validated with Ipv4Addr after match.
static RE_IPV4_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\b(?:\d{1,3}\.){3}\d{1,3}\b"#).expect("valid ipv4 candidate regex"));

/// Network endpoints seen in an artifact's text, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSet {
    pub urls: Vec<String>,
    pub ips: Vec<Ipv4Addr>,
}

pub fn extract_endpoints(units: &[TextUnit]) -> EndpointSet {
    let mut urls = Vec::new();
    let mut ips = Vec::new();
    let mut seen_ips = HashSet::new();

    for unit in units {
        urls.extend(
            RE_URL
                .find_iter(&unit.text)
                .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string()),
        );
        for m in RE_IPV4_CANDIDATE.find_iter(&unit.text) {
            if let Ok(ip) = Ipv4Addr::from_str(m.as_str())
                && seen_ips.insert(ip)
            {
                ips.push(ip);
            }
        }
    }

    dedup_preserving_order(&mut urls);
    EndpointSet { urls, ips }
}

/// Lowercase host of an absolute URL, without userinfo or port.
///
/// Returns `None` when there is no scheme separator or the host is empty.
pub fn host_of(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);

    let host = if let Some(bracketed) = host_port.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or(bracketed)
    } else {
        host_port.split(':').next().unwrap_or(host_port)
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}
