/// A bounded, readable slice of an artifact that content rules run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Archive member name, or `document` for whole-file units.
    pub origin: String,
    pub text: String,
}

impl TextUnit {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }

    /// The first `limit` bytes of a document, decoded lossily.
    pub fn document(bytes: &[u8], limit: u64) -> Self {
        let end = bytes.len().min(usize::try_from(limit).unwrap_or(usize::MAX));
        Self::new("document", String::from_utf8_lossy(&bytes[..end]))
    }
}

/// Heuristic binary check: no NUL bytes and few control bytes.
pub fn is_probably_text(bytes: &[u8]) -> bool {
    !bytes.contains(&0) && control_ratio(bytes) < 0.1
}

/// Fraction of bytes below 0x20, excluding tab, LF and CR.
pub fn control_ratio(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let control = bytes
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r'))
        .count();
    control as f64 / bytes.len() as f64
}
