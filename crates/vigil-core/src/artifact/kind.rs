use std::fmt;

use serde::{Deserialize, Serialize};

/// Artifact kind, used to select the evidence extractors and inspector set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Archive,
    Apk,
    Pdf,
    Url,
    Email,
    /// Unknown or ambiguous content; gets the content-only inspector set.
    Generic,
}

impl ArtifactKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Archive => "archive",
            ArtifactKind::Apk => "apk",
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Url => "url",
            ArtifactKind::Email => "email",
            ArtifactKind::Generic => "generic",
        }
    }

    /// Interpret a caller-declared kind: a short name, an extension or a MIME type.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().trim_start_matches('.').to_ascii_lowercase();
        match hint.as_str() {
            "zip" | "archive" | "application/zip" | "application/x-zip-compressed" => {
                Some(ArtifactKind::Archive)
            }
            "apk" | "application/vnd.android.package-archive" => Some(ArtifactKind::Apk),
            "pdf" | "application/pdf" => Some(ArtifactKind::Pdf),
            "url" | "link" => Some(ArtifactKind::Url),
            "email" | "mail" => Some(ArtifactKind::Email),
            "file" | "generic" | "application/octet-stream" | "text/plain" => {
                Some(ArtifactKind::Generic)
            }
            _ => None,
        }
    }

    /// Kind implied by a file name's extension.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "zip" => Some(ArtifactKind::Archive),
            "apk" => Some(ArtifactKind::Apk),
            "pdf" => Some(ArtifactKind::Pdf),
            _ => None,
        }
    }

    /// Content sniffing from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(ArtifactKind::Pdf);
        }

        let kind = infer::get(bytes)?;
        match kind.mime_type() {
            "application/vnd.android.package-archive" => Some(ArtifactKind::Apk),
            "application/zip" | "application/java-archive" => {
                if contains(bytes, b"AndroidManifest.xml") {
                    Some(ArtifactKind::Apk)
                } else {
                    Some(ArtifactKind::Archive)
                }
            }
            "application/pdf" => Some(ArtifactKind::Pdf),
            _ => None,
        }
    }

    /// Whether an empty payload makes the artifact unreadable for this kind.
    pub fn requires_header(self) -> bool {
        matches!(
            self,
            ArtifactKind::Archive | ArtifactKind::Apk | ArtifactKind::Pdf
        )
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_accept_names_extensions_and_mime_types() {
        assert_eq!(ArtifactKind::from_hint("zip"), Some(ArtifactKind::Archive));
        assert_eq!(ArtifactKind::from_hint(".APK"), Some(ArtifactKind::Apk));
        assert_eq!(
            ArtifactKind::from_hint("application/pdf"),
            Some(ArtifactKind::Pdf)
        );
        assert_eq!(ArtifactKind::from_hint("url"), Some(ArtifactKind::Url));
        assert_eq!(ArtifactKind::from_hint("docx"), None);
    }

    #[test]
    fn filename_extension_is_case_insensitive() {
        assert_eq!(
            ArtifactKind::from_filename("Report.PDF"),
            Some(ArtifactKind::Pdf)
        );
        assert_eq!(ArtifactKind::from_filename("noext"), None);
        assert_eq!(ArtifactKind::from_filename("notes.txt"), None);
    }

    #[test]
    fn sniffs_pdf_header() {
        assert_eq!(
            ArtifactKind::sniff(b"%PDF-1.7\n%..."),
            Some(ArtifactKind::Pdf)
        );
    }

    #[test]
    fn sniffing_plain_text_yields_nothing() {
        assert_eq!(ArtifactKind::sniff(b"hello world"), None);
        assert_eq!(ArtifactKind::sniff(b""), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ArtifactKind::Apk).unwrap(),
            "\"apk\""
        );
    }
}
