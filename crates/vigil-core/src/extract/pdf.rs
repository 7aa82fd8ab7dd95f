//! PDF structure markers.
//!
//! A lexical pass over the raw bytes; objects are not parsed and streams
//! are not inflated. Markers inside compressed streams are not seen.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::EvidenceError;

/// How far into the file the `%PDF-` header may appear.
const HEADER_WINDOW: usize = 1024;

static RE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%PDF-(\d\.\d)").expect("valid pdf version regex"));
static RE_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Type\s*/Page\b").expect("valid page regex"));
static RE_JS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/JS\b").expect("valid js regex"));
static RE_JAVASCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/JavaScript\b").expect("valid javascript regex"));
static RE_EMBEDDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/EmbeddedFiles?\b").expect("valid embedded regex"));
static RE_ATTACHMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/FileAttachment\b").expect("valid attachment regex"));
static RE_ACROFORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/AcroForm\b").expect("valid acroform regex"));
static RE_OPEN_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/OpenAction\b").expect("valid open action regex"));
static RE_LAUNCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Launch\b").expect("valid launch regex"));
static RE_FILESPEC_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?:UF|F)\s*\(([^)\r\n]{1,255})\)").expect("valid filespec regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfMarkers {
    pub version: Option<String>,
    pub page_count: usize,
    pub js: usize,
    pub javascript: usize,
    pub embedded_files: usize,
    pub file_attachments: usize,
    pub acroform: bool,
    pub open_action: bool,
    pub launch: bool,
    /// File names from file specifications (`/F (...)`, `/UF (...)`).
    pub embedded_names: Vec<String>,
}

impl PdfMarkers {
    pub fn has_embedded_content(&self) -> bool {
        self.embedded_files > 0 || self.file_attachments > 0
    }

    pub fn has_script(&self) -> bool {
        self.js > 0 || self.javascript > 0
    }
}

/// The byte offset of the `%PDF-` header, if it appears early enough.
pub fn header_offset(bytes: &[u8]) -> Option<usize> {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(5).position(|w| w == b"%PDF-")
}

pub fn scan_pdf(bytes: &[u8]) -> Result<PdfMarkers, EvidenceError> {
    let start = header_offset(bytes).ok_or(EvidenceError::NotPdf)?;
    let body = &bytes[start..];

    let mut embedded_names: Vec<String> = RE_FILESPEC_NAME
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    embedded_names.sort();
    embedded_names.dedup();

    Ok(PdfMarkers {
        version: RE_VERSION
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned()),
        page_count: RE_PAGE.find_iter(body).count(),
        js: RE_JS.find_iter(body).count(),
        javascript: RE_JAVASCRIPT.find_iter(body).count(),
        embedded_files: RE_EMBEDDED.find_iter(body).count(),
        file_attachments: RE_ATTACHMENT.find_iter(body).count(),
        acroform: RE_ACROFORM.is_match(body),
        open_action: RE_OPEN_ACTION.is_match(body),
        launch: RE_LAUNCH.is_match(body),
        embedded_names,
    })
}
