//! Parsing of URL and email scan targets.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use super::endpoints::host_of;
use crate::error::EvidenceError;

static RE_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid scheme regex"));
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+\-]+@([a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,})$")
        .expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTarget {
    pub raw: String,
    /// Lowercase scheme without `://`.
    pub scheme: String,
    /// Lowercase host without port or userinfo.
    pub host: String,
    pub is_ip: bool,
}

impl UrlTarget {
    pub fn parse(raw: &str) -> Result<Self, EvidenceError> {
        let raw = raw.trim();
        let invalid = |reason: &str| EvidenceError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        let scheme_end = RE_SCHEME
            .find(raw)
            .map(|m| m.end() - 3)
            .ok_or_else(|| invalid("missing scheme"))?;
        let host = host_of(raw).ok_or_else(|| invalid("missing host"))?;
        if !host
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
        {
            return Err(invalid("host contains invalid characters"));
        }

        Ok(Self {
            raw: raw.to_string(),
            scheme: raw[..scheme_end].to_ascii_lowercase(),
            is_ip: host.parse::<IpAddr>().is_ok(),
            host,
        })
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTarget {
    pub address: String,
    /// Lowercase domain part.
    pub domain: String,
}

impl EmailTarget {
    pub fn parse(raw: &str) -> Result<Self, EvidenceError> {
        let raw = raw.trim();
        let domain = RE_EMAIL
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .ok_or_else(|| EvidenceError::InvalidEmail(raw.to_string()))?;

        Ok(Self {
            address: raw.to_ascii_lowercase(),
            domain,
        })
    }
}

/// Parsed target of a URL or email scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Url(UrlTarget),
    Email(EmailTarget),
}

impl Target {
    /// Host whose reputation and shape are checked.
    pub fn host(&self) -> &str {
        match self {
            Target::Url(u) => &u.host,
            Target::Email(e) => &e.domain,
        }
    }
}
